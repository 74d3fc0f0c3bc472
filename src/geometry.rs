//! Small linear-algebra utilities shared by the pipeline stages.
//!
//! # Camera-space convention
//!
//! The detector reports landmarks and the head-pose transform in an
//! image-aligned frame: x to the right of the image, y down the image and z
//! away from the camera. Everything downstream works in camera space: x right,
//! y up, z pointing from the scene toward the camera (the camera looks down
//! −Z). [`detector_to_camera`] is the only place where that flip happens.

use crate::constants::PARALLEL_EPSILON;
use nalgebra::{Matrix4, Vector3};

/// Convert a vector from the detector's image-aligned frame into camera space
#[must_use]
pub fn detector_to_camera(v: Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, -v.y, -v.z)
}

/// Extract the first three components of a basis column of a 4×4 transform
///
/// Returns `None` for a column index outside `0..4`.
#[must_use]
pub fn basis_column(transform: &Matrix4<f64>, column: usize) -> Option<Vector3<f64>> {
    if column >= 4 {
        return None;
    }
    Some(Vector3::new(
        transform[(0, column)],
        transform[(1, column)],
        transform[(2, column)],
    ))
}

/// Half-line in camera space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the ray
    pub origin: Vector3<f64>,
    /// Direction, not necessarily unit length
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Create a new ray
    #[must_use]
    pub const fn new(origin: Vector3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// Point reached after travelling `t` direction-lengths along the ray
    #[must_use]
    pub fn at(&self, t: f64) -> Vector3<f64> {
        self.origin + self.direction * t
    }

    /// True when every component is finite and the direction is non-zero
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.origin.iter().all(|c| c.is_finite())
            && self.direction.iter().all(|c| c.is_finite())
            && self.direction.norm_squared() > 0.0
    }
}

/// Plane in Hessian normal form: `normal · p + constant = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vector3<f64>,
    /// Signed offset from the origin along `-normal`
    pub constant: f64,
}

impl Plane {
    /// Create a plane from a normal and a constant
    ///
    /// The normal is normalized; a zero normal is left untouched.
    #[must_use]
    pub fn new(normal: Vector3<f64>, constant: f64) -> Self {
        let normal = normal.try_normalize(0.0).unwrap_or(normal);
        Self { normal, constant }
    }

    /// Signed distance of `point` from the plane
    #[must_use]
    pub fn distance_to_point(&self, point: &Vector3<f64>) -> f64 {
        self.normal.dot(point) + self.constant
    }

    /// Intersect a ray with this plane
    ///
    /// Returns `None` when the ray is parallel to the plane, when the plane
    /// lies behind the ray origin, or when the result is not finite.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<Vector3<f64>> {
        let denominator = self.normal.dot(&ray.direction);
        if !denominator.is_finite() || denominator.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = -self.distance_to_point(&ray.origin) / denominator;
        if !t.is_finite() || t < 0.0 {
            return None;
        }

        let point = ray.at(t);
        point.iter().all(|c| c.is_finite()).then_some(point)
    }
}
