//! Lossless or clamped numeric conversions for pixel coordinates and counts

/// Clamp and convert f64 to i32 for pixel coordinates
///
/// Non-finite values map to `min`.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i32_clamp(value: f64, min: i32, max: i32) -> i32 {
    // Ensure min <= max
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.clamp(f64::from(min), f64::from(max));
    (clamped as i32).clamp(min, max)
}

/// Convert a count to f64 for ratios and averages
#[must_use]
#[allow(clippy::cast_precision_loss)] // Counts stay far below 2^52
pub fn usize_to_f64(value: usize) -> f64 {
    value as f64
}
