//! Distance compensation from the apparent iris width.
//!
//! The human iris is close to 12 mm across for nearly all adults, so its
//! width in pixels gives the pixels-per-millimetre scale at the user's
//! current distance from the camera.

use crate::{
    constants::{DEFAULT_IRIS_WIDTH_MM, LEFT_IRIS_EDGES, RIGHT_IRIS_EDGES},
    landmarks::PointCloud,
    Error, Result,
};

/// Derives the pixel-per-millimetre scale ratio from iris landmarks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrisCalibrator {
    iris_width_mm: f64,
}

impl IrisCalibrator {
    /// Create a calibrator for a known iris width in millimetres
    ///
    /// # Errors
    ///
    /// Returns an error if the width is not finite and positive.
    pub fn new(iris_width_mm: f64) -> Result<Self> {
        if !iris_width_mm.is_finite() || iris_width_mm <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Iris width must be positive, got {iris_width_mm} mm"
            )));
        }
        Ok(Self { iris_width_mm })
    }

    /// Known anatomical iris width
    #[must_use]
    pub const fn iris_width_mm(&self) -> f64 {
        self.iris_width_mm
    }

    /// Average apparent width of both irises in pixels
    ///
    /// Returns `None` if the cloud has no iris points.
    #[must_use]
    pub fn iris_width_px(&self, cloud: &PointCloud) -> Option<f64> {
        let edge_distance = |(a, b): (usize, usize)| Some((cloud.get(a)? - cloud.get(b)?).norm());
        let right = edge_distance(RIGHT_IRIS_EDGES)?;
        let left = edge_distance(LEFT_IRIS_EDGES)?;
        Some((right + left) / 2.0)
    }

    /// Pixels per millimetre at the user's current distance
    ///
    /// Returns `None` unless the ratio is finite and positive.
    #[must_use]
    pub fn scale_ratio(&self, cloud: &PointCloud) -> Option<f64> {
        let ratio = self.iris_width_px(cloud)? / self.iris_width_mm;
        (ratio.is_finite() && ratio > 0.0).then_some(ratio)
    }
}

impl Default for IrisCalibrator {
    fn default() -> Self {
        Self {
            iris_width_mm: DEFAULT_IRIS_WIDTH_MM,
        }
    }
}
