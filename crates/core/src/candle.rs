//! OHLCV bars and the fixed set of analysis timeframes.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One OHLCV bar. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
}

/// Open interest for one symbol. `average` is an approximation supplied by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenInterest {
    pub latest: f64,
    pub average: f64,
}

impl OpenInterest {
    /// Notional value of the open interest at `price`.
    #[must_use]
    pub fn notional(&self, price: f64) -> f64 {
        self.latest * price
    }
}

/// Timeframes fetched for every symbol each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    ThreeMinutes,
    FifteenMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl Timeframe {
    pub const ALL: [Self; 5] = [
        Self::ThreeMinutes,
        Self::FifteenMinutes,
        Self::OneHour,
        Self::FourHours,
        Self::OneDay,
    ];

    /// Returns the exchange interval string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreeMinutes => "3m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
        }
    }

    #[must_use]
    pub const fn duration_ms(self) -> i64 {
        match self {
            Self::ThreeMinutes => 180_000,
            Self::FifteenMinutes => 900_000,
            Self::OneHour => 3_600_000,
            Self::FourHours => 14_400_000,
            Self::OneDay => 86_400_000,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "3m" => Ok(Self::ThreeMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "1h" => Ok(Self::OneHour),
            "4h" => Ok(Self::FourHours),
            "1d" => Ok(Self::OneDay),
            _ => Err(anyhow!(
                "Invalid timeframe: '{s}'. Valid values: 3m, 15m, 1h, 4h, 1d"
            )),
        }
    }
}

/// Returns true if open times strictly increase and bars do not overlap.
#[must_use]
pub fn is_well_ordered(candles: &[Candle]) -> bool {
    candles
        .windows(2)
        .all(|w| w[0].open_time < w[1].open_time && w[0].close_time < w[1].open_time)
}

/// Upper-cases a symbol and appends the `USDT` quote asset when missing.
#[must_use]
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    if upper.ends_with("USDT") {
        upper
    } else {
        format!("{upper}USDT")
    }
}
