use super::{ema_series, require, IndicatorResult};

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const SIGNAL_PERIOD: usize = 9;

/// MACD line (EMA12 - EMA26) and its EMA9 signal line.
///
/// `line[0]` lines up with input index `SLOW_PERIOD - 1`. The signal runs
/// over the defined portion of the line only, so `signal[0]` lines up with
/// `line[SIGNAL_PERIOD - 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
}

impl MacdSeries {
    /// Latest line and signal values.
    #[must_use]
    pub fn latest(&self) -> (f64, f64) {
        (
            self.line.last().copied().unwrap_or_default(),
            self.signal.last().copied().unwrap_or_default(),
        )
    }
}

/// Full MACD series.
///
/// # Errors
/// Needs `SLOW_PERIOD + SIGNAL_PERIOD - 1` values so the signal line exists.
pub fn macd_series(values: &[f64]) -> IndicatorResult<MacdSeries> {
    require("MACD signal", SLOW_PERIOD + SIGNAL_PERIOD - 1, values.len())?;

    let line = macd_line(values)?;
    let signal = ema_series(&line, SIGNAL_PERIOD)?;
    Ok(MacdSeries { line, signal })
}

/// Latest MACD line value.
///
/// # Errors
/// Needs `SLOW_PERIOD` values.
pub fn macd(values: &[f64]) -> IndicatorResult<f64> {
    let line = macd_line(values)?;
    Ok(line[line.len() - 1])
}

fn macd_line(values: &[f64]) -> IndicatorResult<Vec<f64>> {
    require("MACD", SLOW_PERIOD, values.len())?;
    let fast = ema_series(values, FAST_PERIOD)?;
    let slow = ema_series(values, SLOW_PERIOD)?;
    let offset = SLOW_PERIOD - FAST_PERIOD;
    Ok(slow
        .iter()
        .enumerate()
        .map(|(i, s)| fast[i + offset] - s)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::closes;
    use crate::indicators::test_support::{assert_close, synthetic_candles};

    #[test]
    fn test_macd_flat_series_is_zero() {
        let values = vec![50.0; 40];
        let series = macd_series(&values).unwrap();
        assert!(series.line.iter().all(|v| v.abs() < 1e-12));
        assert!(series.signal.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_macd_line_needs_slow_period() {
        let values = vec![1.0; 25];
        assert_eq!(macd(&values).unwrap_err().required, 26);
        assert!(macd(&[values, vec![1.0]].concat()).is_ok());
    }

    #[test]
    fn test_macd_signal_needs_34_bars() {
        let values = vec![1.0; 33];
        let err = macd_series(&values).unwrap_err();
        assert_eq!(err.required, 34);
    }

    #[test]
    fn test_macd_golden_values() {
        let values = closes(&synthetic_candles(60));
        let series = macd_series(&values).unwrap();
        assert_eq!(series.line.len(), 35);
        assert_eq!(series.signal.len(), 27);

        let (line, signal) = series.latest();
        assert_close(line, 1.837627236718518);
        assert_close(signal, 1.7045531626221626);
        assert_close(macd(&values).unwrap(), 1.837627236718518);
    }
}
