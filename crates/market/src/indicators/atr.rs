use super::{require, IndicatorResult};
use algo_trade_core::Candle;

/// True range for every bar after the first.
///
/// `tr[i]` is `max(high - low, |high - prev_close|, |low - prev_close|)` for
/// input bar `i + 1`.
#[must_use]
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|pair| {
            let (prev, bar) = (&pair[0], &pair[1]);
            (bar.high - bar.low)
                .max((bar.high - prev.close).abs())
                .max((bar.low - prev.close).abs())
        })
        .collect()
}

/// Wilder average true range.
///
/// # Errors
/// Needs `period + 1` candles.
pub fn atr(candles: &[Candle], period: usize) -> IndicatorResult<f64> {
    if period == 0 {
        require("ATR", 0, candles.len())?;
    }
    require("ATR", period + 1, candles.len())?;

    let ranges = true_ranges(candles);
    let p = period as f64;
    let seed = ranges[..period].iter().sum::<f64>() / p;
    Ok(ranges[period..]
        .iter()
        .fold(seed, |acc, &tr| (acc * (p - 1.0) + tr) / p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_close, flat_candles, synthetic_candles};

    #[test]
    fn test_true_range_uses_previous_close_gap() {
        let mut candles = flat_candles(&[100.0, 110.0]);
        candles[1].high = 111.0;
        candles[1].low = 109.0;
        // gap up: |109 - 100| dominates high - low
        assert_eq!(true_ranges(&candles), vec![11.0]);
    }

    #[test]
    fn test_atr_flat_series_is_zero() {
        let candles = flat_candles(&[10.0; 20]);
        assert_eq!(atr(&candles, 14).unwrap(), 0.0);
    }

    #[test]
    fn test_atr_requires_period_plus_one() {
        let candles = synthetic_candles(14);
        assert_eq!(atr(&candles, 14).unwrap_err().required, 15);
        assert!(atr(&synthetic_candles(15), 14).is_ok());
    }

    #[test]
    fn test_atr_golden_value() {
        assert_close(atr(&synthetic_candles(60), 14).unwrap(), 6.1944078762670705);
    }
}
