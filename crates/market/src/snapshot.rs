//! Per-timeframe indicator snapshots and the per-symbol market snapshot.
//!
//! Each timeframe snapshot is computed once from its candle series and never
//! mutated. Individual indicators that lack enough bars are `None`, so a
//! young listing still yields the values it can support.

use algo_trade_core::{Candle, OpenInterest, Timeframe};
use serde::{Deserialize, Serialize};

use crate::indicators::{
    self, adx, atr, bollinger, ema, last_n, macd, macd_series, rsi, rsi_series,
    support_resistance, AdxReading, BollingerBand, IndicatorResult, PriceLevels,
};

/// Number of trailing values kept for series fields.
pub const SERIES_LEN: usize = 10;

/// Bars used for 4h support and resistance.
pub const LEVELS_LOOKBACK: usize = 20;

fn available<T>(result: IndicatorResult<T>, timeframe: Timeframe) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(timeframe = %timeframe, "{}", e);
            None
        }
    }
}

/// 3m execution timeframe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntradaySnapshot {
    pub ema20: Option<f64>,
    pub macd: Option<f64>,
    pub rsi7: Option<f64>,
    pub atr14: Option<f64>,
    pub bollinger: Option<BollingerBand>,
}

impl IntradaySnapshot {
    #[must_use]
    pub fn from_candles(candles: &[Candle]) -> Self {
        let tf = Timeframe::ThreeMinutes;
        let closes = indicators::closes(candles);
        Self {
            ema20: available(ema(&closes, 20), tf),
            macd: available(macd(&closes), tf),
            rsi7: available(rsi(&closes, 7), tf),
            atr14: available(atr(candles, 14), tf),
            bollinger: available(bollinger(&closes, 20, 2.0), tf),
        }
    }
}

/// 15m trigger timeframe: trailing windows rather than scalars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FifteenMinuteSnapshot {
    pub rsi14_values: Vec<f64>,
    pub macd_line_values: Vec<f64>,
    pub macd_signal_values: Vec<f64>,
}

impl FifteenMinuteSnapshot {
    #[must_use]
    pub fn from_candles(candles: &[Candle]) -> Self {
        let tf = Timeframe::FifteenMinutes;
        let closes = indicators::closes(candles);

        let rsi14_values = available(rsi_series(&closes, 14), tf)
            .map(|s| last_n(&s, SERIES_LEN))
            .unwrap_or_default();

        let (macd_line_values, macd_signal_values) = match available(macd_series(&closes), tf) {
            Some(series) => (last_n(&series.line, SERIES_LEN), last_n(&series.signal, SERIES_LEN)),
            None => (Vec::new(), Vec::new()),
        };

        Self {
            rsi14_values,
            macd_line_values,
            macd_signal_values,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneHourSnapshot {
    pub ema50: Option<f64>,
    pub atr14: Option<f64>,
}

impl OneHourSnapshot {
    #[must_use]
    pub fn from_candles(candles: &[Candle]) -> Self {
        let tf = Timeframe::OneHour;
        let closes = indicators::closes(candles);
        Self {
            ema50: available(ema(&closes, 50), tf),
            atr14: available(atr(candles, 14), tf),
        }
    }
}

/// 4h trend timeframe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FourHourSnapshot {
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub adx14: Option<AdxReading>,
    pub atr14: Option<f64>,
    pub levels: Option<PriceLevels>,
}

impl FourHourSnapshot {
    #[must_use]
    pub fn from_candles(candles: &[Candle]) -> Self {
        let tf = Timeframe::FourHours;
        let closes = indicators::closes(candles);
        Self {
            ema20: available(ema(&closes, 20), tf),
            ema50: available(ema(&closes, 50), tf),
            adx14: available(adx(candles, 14), tf),
            atr14: available(atr(candles, 14), tf),
            levels: available(support_resistance(candles, LEVELS_LOOKBACK), tf),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub ema50: Option<f64>,
}

impl DailySnapshot {
    #[must_use]
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            ema50: available(ema(&indicators::closes(candles), 50), Timeframe::OneDay),
        }
    }
}

/// Everything known about one symbol for one decision cycle.
///
/// A timeframe whose fetch failed is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub current_price: f64,
    /// Percent change against the previous 1h close.
    pub price_change_1h: f64,
    pub price_change_4h: f64,
    pub intraday: Option<IntradaySnapshot>,
    pub fifteen_minute: Option<FifteenMinuteSnapshot>,
    pub one_hour: Option<OneHourSnapshot>,
    pub four_hour: Option<FourHourSnapshot>,
    pub daily: Option<DailySnapshot>,
    pub open_interest: Option<OpenInterest>,
    pub funding_rate: Option<f64>,
}

impl MarketSnapshot {
    /// Open-interest notional at the current price, when OI is known.
    #[must_use]
    pub fn open_interest_notional(&self) -> Option<f64> {
        self.open_interest.map(|oi| oi.notional(self.current_price))
    }

    /// False only when OI is known and its notional sits under `floor_usd`.
    #[must_use]
    pub fn meets_liquidity_floor(&self, floor_usd: f64) -> bool {
        if self.current_price <= 0.0 {
            return true;
        }
        self.open_interest_notional()
            .map_or(true, |notional| notional >= floor_usd)
    }

    /// Timeframes missing from this snapshot.
    #[must_use]
    pub fn missing_timeframes(&self) -> Vec<Timeframe> {
        let present = [
            self.intraday.is_some(),
            self.fifteen_minute.is_some(),
            self.one_hour.is_some(),
            self.four_hour.is_some(),
            self.daily.is_some(),
        ];
        Timeframe::ALL
            .iter()
            .zip(present)
            .filter(|(_, ok)| !ok)
            .map(|(tf, _)| *tf)
            .collect()
    }
}

/// Percent change of `current` against the second-to-last close.
#[must_use]
pub fn change_vs_previous_close(candles: &[Candle], current: f64) -> f64 {
    match candles.len().checked_sub(2).map(|i| candles[i].close) {
        Some(previous) if previous > 0.0 => (current - previous) / previous * 100.0,
        _ => 0.0,
    }
}
