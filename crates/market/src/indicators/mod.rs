//! Pure indicator transforms over candle slices.
//!
//! Every function returns [`InsufficientData`] when the input is shorter than
//! the lookback it needs, so callers always branch on availability instead of
//! receiving a silent zero or NaN.
//!
//! Series functions return only the defined portion of the output: element 0
//! corresponds to the first input index at which the indicator exists.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod levels;
pub mod macd;
pub mod rsi;

pub use adx::{adx, AdxReading};
pub use atr::{atr, true_ranges};
pub use bollinger::{bollinger, bollinger_series, BollingerBand};
pub use ema::{ema, ema_series};
pub use levels::{support_resistance, PriceLevels};
pub use macd::{macd, macd_series, MacdSeries};
pub use rsi::{rsi, rsi_series};

use algo_trade_core::Candle;
use thiserror::Error;

/// Input series too short for the requested lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{indicator} needs at least {required} bars, got {available}")]
pub struct InsufficientData {
    pub indicator: &'static str,
    pub required: usize,
    pub available: usize,
}

pub type IndicatorResult<T> = Result<T, InsufficientData>;

pub(crate) fn require(indicator: &'static str, required: usize, available: usize) -> IndicatorResult<()> {
    if required == 0 || available < required {
        return Err(InsufficientData {
            indicator,
            required: required.max(1),
            available,
        });
    }
    Ok(())
}

#[must_use]
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Last `n` values, or all of them when fewer exist.
#[must_use]
pub fn last_n(values: &[f64], n: usize) -> Vec<f64> {
    values[values.len().saturating_sub(n)..].to_vec()
}

#[cfg(test)]
pub(crate) mod test_support {
    use algo_trade_core::Candle;

    /// Deterministic zig-zag uptrend used for golden values.
    pub fn synthetic_candles(n: usize) -> Vec<Candle> {
        let mut out: Vec<Candle> = Vec::with_capacity(n);
        for i in 0..n {
            let close = 100.0 + ((i * 7) % 13) as f64 * 0.8 + i as f64 * 0.25;
            let high = close + 0.5 + ((i * 3) % 5) as f64 * 0.3;
            let low = close - 0.5 - ((i * 5) % 7) as f64 * 0.2;
            let open = out.last().map_or(close, |prev| prev.close);
            let open_time = i as i64 * 180_000;
            out.push(Candle {
                open_time,
                open,
                high,
                low,
                close,
                volume: 1_000.0,
                close_time: open_time + 179_999,
            });
        }
        out
    }

    pub fn flat_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                open_time: i as i64 * 60_000,
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
                close_time: i as i64 * 60_000 + 59_999,
            })
            .collect()
    }

    pub fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-6 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }
}
