//! Decimal rounding shared by provider, fallback and aggregation code.

/// Round `value` to `places` decimal places, halves away from zero.
#[expect(clippy::float_arithmetic, reason = "decimal rounding")]
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}
