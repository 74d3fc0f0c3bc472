//! Physical screen geometry and the mapping from focal-plane hits to pixels.
//!
//! Screen dimensions are known in millimetres, while focal-plane
//! intersections are in camera pixel units. The iris scale ratio (pixels per
//! millimetre at the user's current distance) bridges the two every tick.

use crate::{
    camera::Resolution,
    constants::MM_PER_INCH,
    utils::safe_cast::f64_to_i32_clamp,
    Error, Result,
};
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Camera-space position of the screen corner nearest camera −x on its top edge
///
/// The screen spans `x..x + width` along camera x and `y - height..y` along
/// camera y (up). A laptop camera centered over the screen is
/// `x = -width / 2, y = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetMm {
    /// Camera-space x of the corner
    pub x: f64,
    /// Camera-space y of the top edge
    pub y: f64,
}

/// Visible screen area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeMm {
    /// Width in millimetres
    pub width: f64,
    /// Height in millimetres
    pub height: f64,
}

/// Physical description of the screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenGeometry {
    /// Diagonal size; the camera is assumed centered on the top edge
    Diagonal {
        /// Diagonal in inches
        diagonal_inches: f64,
    },
    /// Explicit placement and size
    Explicit {
        /// Top-left corner relative to the camera
        offset_mm: OffsetMm,
        /// Visible area
        size_mm: SizeMm,
    },
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::Diagonal { diagonal_inches: 15.6 }
    }
}

/// Screen half-extent and center in camera space, millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenLayout {
    /// Half width and half height
    pub half_scale: Vector2<f64>,
    /// Screen center relative to the camera (x right, y up in camera space)
    pub center: Vector2<f64>,
}

impl ScreenLayout {
    /// Resolve a screen geometry for a screen of the given pixel resolution
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive sizes or a zero resolution.
    pub fn from_geometry(geometry: &ScreenGeometry, resolution: Resolution) -> Result<Self> {
        if !resolution.is_valid() {
            return Err(Error::InvalidInput(format!(
                "Screen resolution must be non-zero, got {resolution}"
            )));
        }

        match *geometry {
            ScreenGeometry::Diagonal { diagonal_inches } => {
                if !diagonal_inches.is_finite() || diagonal_inches <= 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "Screen diagonal must be positive, got {diagonal_inches} in"
                    )));
                }
                let px_per_mm = resolution.diagonal() / (diagonal_inches * MM_PER_INCH);
                let half_scale = Vector2::new(
                    resolution.width_f64() / 2.0 / px_per_mm,
                    resolution.height_f64() / 2.0 / px_per_mm,
                );
                Ok(Self {
                    half_scale,
                    center: Vector2::new(0.0, -half_scale.y),
                })
            }
            ScreenGeometry::Explicit { offset_mm, size_mm } => {
                let finite = [offset_mm.x, offset_mm.y, size_mm.width, size_mm.height]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite || size_mm.width <= 0.0 || size_mm.height <= 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "Screen size must be positive and finite, got {}x{} mm at ({}, {})",
                        size_mm.width, size_mm.height, offset_mm.x, offset_mm.y
                    )));
                }
                let half_scale = Vector2::new(size_mm.width / 2.0, size_mm.height / 2.0);
                let center = Vector2::new(offset_mm.x + half_scale.x, offset_mm.y - half_scale.y);
                Ok(Self { half_scale, center })
            }
        }
    }

    /// Layout expressed in camera pixel units for a given scale ratio
    #[must_use]
    pub fn scaled(&self, scale_ratio: f64) -> Self {
        Self {
            half_scale: self.half_scale * scale_ratio,
            center: self.center * scale_ratio,
        }
    }
}

/// Converts focal-plane intersections into screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMapper {
    resolution: Resolution,
    half_extent_px: Vector2<f64>,
    layout: ScreenLayout,
}

impl ScreenMapper {
    /// Create a mapper for a screen of the given pixel resolution
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry cannot be resolved.
    pub fn new(resolution: Resolution, geometry: &ScreenGeometry) -> Result<Self> {
        let layout = ScreenLayout::from_geometry(geometry, resolution)?;
        Ok(Self {
            resolution,
            half_extent_px: Vector2::new(resolution.width_f64() / 2.0, resolution.height_f64() / 2.0),
            layout,
        })
    }

    /// Screen resolution in pixels
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Half width and half height in pixels
    #[must_use]
    pub const fn half_extent_px(&self) -> Vector2<f64> {
        self.half_extent_px
    }

    /// Physical layout in millimetres
    #[must_use]
    pub const fn layout(&self) -> &ScreenLayout {
        &self.layout
    }

    /// Map a focal-plane intersection to a screen pixel target
    ///
    /// Returns `None` when the scale ratio is not finite and positive or any
    /// normalized coordinate is not finite.
    #[must_use]
    pub fn map(&self, intersection: &Vector3<f64>, scale_ratio: f64) -> Option<Vector2<f64>> {
        if !scale_ratio.is_finite() || scale_ratio <= 0.0 {
            return None;
        }

        let real = self.layout.scaled(scale_ratio);
        let normalized = (intersection.xy() - real.center).component_div(&real.half_scale);
        if !normalized.iter().all(|c| c.is_finite()) {
            return None;
        }

        // Mirrored on both axes: the screen faces the camera's viewer and
        // pixel rows grow downward
        Some(Vector2::new(
            (1.0 - normalized.x) * self.half_extent_px.x,
            (1.0 - normalized.y) * self.half_extent_px.y,
        ))
    }

    /// Round a target to the nearest on-screen pixel
    ///
    /// Returns `None` if the target is not finite.
    #[must_use]
    pub fn to_pixel(&self, target: &Vector2<f64>) -> Option<(i32, i32)> {
        if !target.iter().all(|c| c.is_finite()) {
            return None;
        }
        let max_x = i32::try_from(self.resolution.width.saturating_sub(1)).unwrap_or(i32::MAX);
        let max_y = i32::try_from(self.resolution.height.saturating_sub(1)).unwrap_or(i32::MAX);
        Some((
            f64_to_i32_clamp(target.x.round(), 0, max_x),
            f64_to_i32_clamp(target.y.round(), 0, max_y),
        ))
    }
}
