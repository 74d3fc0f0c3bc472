//! Small numeric helpers shared across modules.

pub mod safe_cast;

use nalgebra::Vector2;

/// True when both components are finite
#[must_use]
pub fn is_finite2(v: &Vector2<f64>) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
