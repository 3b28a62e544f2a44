use super::{require, IndicatorResult};
use algo_trade_core::Candle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub support: f64,
    pub resistance: f64,
}

/// Lowest low and highest high over the trailing `lookback` bars.
///
/// # Errors
/// Needs `lookback` candles.
pub fn support_resistance(candles: &[Candle], lookback: usize) -> IndicatorResult<PriceLevels> {
    require("Support/Resistance", lookback, candles.len())?;
    let window = &candles[candles.len() - lookback..];
    let support = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let resistance = window
        .iter()
        .map(|c| c.high)
        .fold(f64::NEG_INFINITY, f64::max);
    Ok(PriceLevels {
        support,
        resistance,
    })
}
