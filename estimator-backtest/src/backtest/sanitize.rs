//! Numeric sanitizer.
//!
//! Every derived number passes through here before it leaves the engine, so
//! callers and serializers never see NaN or Infinity.

/// Decimal places for summary statistics.
pub const STAT_DECIMALS: u32 = 2;

/// Decimal places for per-date series.
pub const SERIES_DECIMALS: u32 = 4;

/// Map a possibly undefined statistic to a defined value.
///
/// Missing, NaN and infinite values become `0.0`.
pub fn safe_stat(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// [`safe_stat`] for a value that is always present.
pub fn sanitize(value: f64) -> f64 {
    safe_stat(Some(value))
}

/// Round half away from zero to `places` decimals.
///
/// Values too large to scale are returned unchanged. Negative zero is
/// normalized to `0.0`.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Sanitize then round a summary statistic.
pub fn round_stat(value: f64) -> f64 {
    round_to(sanitize(value), STAT_DECIMALS)
}

/// Sanitize then round every value of a series.
pub fn round_series(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|&v| round_to(sanitize(v), SERIES_DECIMALS))
        .collect()
}
