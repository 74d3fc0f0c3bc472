//! Pinhole camera model derived from a diagonal field of view.

use crate::{geometry::Plane, Error, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of a frame or a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Resolution {
    /// Create a new resolution
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width as a float
    #[must_use]
    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    /// Height as a float
    #[must_use]
    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }

    /// Length of the diagonal in pixels
    #[must_use]
    pub fn diagonal(self) -> f64 {
        self.width_f64().hypot(self.height_f64())
    }

    /// Both dimensions are non-zero
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Camera intrinsics for the negotiated capture resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    diagonal_fov: f64,
    resolution: Resolution,
    aspect_ratio: f64,
    diagonal_px: f64,
    focal_length: f64,
    vertical_fov: f64,
    focal_plane: Plane,
}

impl CameraModel {
    /// Create a camera model from a diagonal field of view (radians) and the
    /// negotiated frame resolution
    ///
    /// # Errors
    ///
    /// Returns an error if the field of view is not in `(0, π)` or the
    /// resolution has a zero dimension.
    pub fn new(diagonal_fov: f64, resolution: Resolution) -> Result<Self> {
        if !diagonal_fov.is_finite() || diagonal_fov <= 0.0 || diagonal_fov >= std::f64::consts::PI {
            return Err(Error::InvalidInput(format!(
                "Diagonal field of view must be in (0, π) radians, got {diagonal_fov}"
            )));
        }
        if !resolution.is_valid() {
            return Err(Error::InvalidInput(format!(
                "Frame resolution must be non-zero, got {resolution}"
            )));
        }

        let half_tan = (diagonal_fov / 2.0).tan();
        let diagonal_px = resolution.diagonal();
        let focal_length = (diagonal_px / 2.0) / half_tan;
        let aspect_ratio = resolution.width_f64() / resolution.height_f64();
        let vertical_fov = 2.0 * (half_tan * (1.0 / aspect_ratio).atan().sin()).atan();

        // One focal length down the optical axis
        let focal_plane = Plane::new(Vector3::new(0.0, 0.0, 1.0), focal_length);

        Ok(Self {
            diagonal_fov,
            resolution,
            aspect_ratio,
            diagonal_px,
            focal_length,
            vertical_fov,
            focal_plane,
        })
    }

    /// Diagonal field of view in radians
    #[must_use]
    pub const fn diagonal_fov(&self) -> f64 {
        self.diagonal_fov
    }

    /// Frame resolution the model was derived for
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Frame width over frame height
    #[must_use]
    pub const fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Frame diagonal in pixels
    #[must_use]
    pub const fn diagonal_px(&self) -> f64 {
        self.diagonal_px
    }

    /// Focal length in pixels
    #[must_use]
    pub const fn focal_length(&self) -> f64 {
        self.focal_length
    }

    /// Vertical field of view in radians, for projection and visualization
    #[must_use]
    pub const fn vertical_fov(&self) -> f64 {
        self.vertical_fov
    }

    /// Plane standing in for the screen depth
    #[must_use]
    pub const fn focal_plane(&self) -> &Plane {
        &self.focal_plane
    }

    /// True if this model was derived for `resolution`
    #[must_use]
    pub fn same_resolution(&self, resolution: Resolution) -> bool {
        self.resolution == resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_focal_length_for_ninety_degrees() {
        // tan(45°) = 1, so the focal length is half the diagonal
        let camera = CameraModel::new(std::f64::consts::FRAC_PI_2, Resolution::new(300, 400)).unwrap();
        assert!((camera.diagonal_px() - 500.0).abs() < 1e-9);
        assert!((camera.focal_length() - 250.0).abs() < 1e-9);
        assert!((camera.aspect_ratio() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_focal_plane_sits_one_focal_length_down_the_optical_axis() {
        let camera = CameraModel::new(80f64.to_radians(), Resolution::new(1920, 1080)).unwrap();
        let plane = camera.focal_plane();
        let on_plane = Vector3::new(0.0, 0.0, -camera.focal_length());
        assert!(plane.distance_to_point(&on_plane).abs() < 1e-9);
        assert!(plane.distance_to_point(&Vector3::zeros()) > 0.0);
    }

    #[test]
    fn test_vertical_fov_is_smaller_than_diagonal() {
        let camera = CameraModel::new(80f64.to_radians(), Resolution::new(1920, 1080)).unwrap();
        assert!(camera.vertical_fov() > 0.0);
        assert!(camera.vertical_fov() < camera.diagonal_fov());

        // Vertical half-extent seen through the vertical fov matches the frame
        let half_height = camera.focal_length() * (camera.vertical_fov() / 2.0).tan();
        assert!((half_height - 540.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(CameraModel::new(0.0, Resolution::new(640, 480)).is_err());
        assert!(CameraModel::new(std::f64::consts::PI, Resolution::new(640, 480)).is_err());
        assert!(CameraModel::new(f64::NAN, Resolution::new(640, 480)).is_err());
        assert!(CameraModel::new(1.0, Resolution::new(0, 480)).is_err());
        assert!(CameraModel::new(1.0, Resolution::new(640, 0)).is_err());
    }

    #[test]
    fn test_same_resolution() {
        let camera = CameraModel::new(1.2, Resolution::new(640, 480)).unwrap();
        assert!(camera.same_resolution(Resolution::new(640, 480)));
        assert!(!camera.same_resolution(Resolution::new(1280, 720)));
    }

    proptest! {
        #[test]
        fn prop_focal_length_increases_as_fov_narrows(
            wide in 0.2f64..3.0,
            delta in 0.01f64..0.19,
            width in 16u32..8192,
            height in 16u32..8192,
        ) {
            let resolution = Resolution::new(width, height);
            let narrow = wide - delta;
            let f_wide = CameraModel::new(wide, resolution).unwrap().focal_length();
            let f_narrow = CameraModel::new(narrow, resolution).unwrap().focal_length();
            prop_assert!(f_wide > 0.0);
            prop_assert!(f_narrow > f_wide);
        }
    }
}
