//! Gaze ray construction from the detector's head-pose transform.

use crate::{
    constants::{ANCHOR_LANDMARK, EPSILON},
    geometry::{basis_column, detector_to_camera, Ray},
    landmarks::PointCloud,
};
use nalgebra::{Matrix4, Vector3};

/// Column of the head-pose transform holding the head's local forward axis
const FORWARD_COLUMN: usize = 2;

/// Head's forward direction in camera space
///
/// Returns `None` if the direction is (near) zero-length or not finite.
#[must_use]
pub fn forward_direction(transform: &Matrix4<f64>) -> Option<Vector3<f64>> {
    let forward = detector_to_camera(basis_column(transform, FORWARD_COLUMN)?);
    (forward.iter().all(|c| c.is_finite()) && forward.norm_squared() > EPSILON).then_some(forward)
}

/// Build the gaze ray from the anchor landmark along the head's forward axis
///
/// Returns `None` when the cloud does not reach the anchor index or the
/// transform yields no usable direction.
#[must_use]
pub fn build_gaze_ray(transform: &Matrix4<f64>, cloud: &PointCloud) -> Option<Ray> {
    let origin = *cloud.get(ANCHOR_LANDMARK)?;
    let direction = forward_direction(transform)?;
    let ray = Ray::new(origin, direction);
    ray.is_valid().then_some(ray)
}
