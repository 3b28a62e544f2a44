use super::{require, IndicatorResult};

/// Exponential moving average over raw values.
///
/// Seeded with the simple average of the first `period` values, then
/// `ema = (x - ema) * 2/(period+1) + ema`. Element 0 of the result is the
/// seed and lines up with input index `period - 1`.
///
/// # Errors
/// Returns [`super::InsufficientData`] when fewer than `period` values exist.
pub fn ema_series(values: &[f64], period: usize) -> IndicatorResult<Vec<f64>> {
    require("EMA", period, values.len())?;

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut current = seed;
    for &value in &values[period..] {
        current = (value - current) * multiplier + current;
        out.push(current);
    }
    Ok(out)
}

/// Latest EMA value.
///
/// # Errors
/// Returns [`super::InsufficientData`] when fewer than `period` values exist.
pub fn ema(values: &[f64], period: usize) -> IndicatorResult<f64> {
    let series = ema_series(values, period)?;
    Ok(series[series.len() - 1])
}
