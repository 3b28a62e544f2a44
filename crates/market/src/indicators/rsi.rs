use super::{require, IndicatorResult};

/// Wilder RSI series.
///
/// Average gain and loss are seeded from the first `period` deltas and then
/// smoothed with `avg = (avg * (period - 1) + x) / period`. A zero average
/// loss saturates at 100. Element 0 lines up with input index `period`.
///
/// # Errors
/// Returns [`super::InsufficientData`] unless at least `period + 1` values exist.
pub fn rsi_series(values: &[f64], period: usize) -> IndicatorResult<Vec<f64>> {
    if period == 0 {
        require("RSI", 0, values.len())?;
    }
    require("RSI", period + 1, values.len())?;

    let p = period as f64;
    let (mut gains, mut losses) = (0.0, 0.0);
    for i in 1..=period {
        let change = values[i] - values[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }
    let mut avg_gain = gains / p;
    let mut avg_loss = losses / p;

    let mut out = Vec::with_capacity(values.len() - period);
    out.push(relative_strength(avg_gain, avg_loss));

    for i in (period + 1)..values.len() {
        let change = values[i] - values[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        out.push(relative_strength(avg_gain, avg_loss));
    }
    Ok(out)
}

/// Latest RSI value.
///
/// # Errors
/// Returns [`super::InsufficientData`] unless at least `period + 1` values exist.
pub fn rsi(values: &[f64], period: usize) -> IndicatorResult<f64> {
    let series = rsi_series(values, period)?;
    Ok(series[series.len() - 1])
}

fn relative_strength(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss > 0.0 {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    } else {
        100.0
    }
}
