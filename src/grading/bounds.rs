//! Tolerance bands and the similarity score every contour check is built on.

/// Returns `(lower, upper)` for a fractional tolerance around `target`.
pub fn bounds(target: f64, tolerance: f64) -> (f64, f64) {
    debug_assert!(tolerance >= 0.0, "tolerance must be non-negative");
    (target * (1.0 - tolerance), target * (1.0 + tolerance))
}

/// Whether `value` lies in the closed band around `target`.
pub fn within(target: f64, tolerance: f64, value: f64) -> bool {
    let (lower, upper) = bounds(target, tolerance);
    value >= lower && value <= upper
}

/// Closeness in `(0, 1]`, exactly 1 when the values are equal.
pub fn similarity(expected: f64, actual: f64) -> f64 {
    1.0 / (1.0 + (expected - actual).abs())
}

/// Like [`similarity`], but flat at 1 across the tolerance band and measured
/// from the nearest band edge outside it.
pub fn similarity_with_tolerance(expected: f64, actual: f64, tolerance: f64) -> f64 {
    let (lower, upper) = bounds(expected, tolerance);
    if actual < lower {
        similarity(lower, actual)
    } else if actual > upper {
        similarity(upper, actual)
    } else {
        1.0
    }
}
