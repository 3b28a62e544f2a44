//! Market data for the decision engine.
//!
//! - [`binance`]: REST client for candles, open interest and funding
//! - [`indicators`]: pure indicator transforms
//! - [`snapshot`]: per-timeframe indicator snapshots
//! - [`builder`]: concurrent multi-symbol snapshot construction with the liquidity filter
//! - [`format`]: markdown rendering for prompts

pub mod binance;
pub mod builder;
pub mod error;
pub mod format;
pub mod indicators;
pub mod snapshot;

pub use binance::{BinanceFuturesClient, BINANCE_FUTURES_API};
pub use builder::{MarketSnapshotBuilder, UniverseSnapshot};
pub use error::MarketDataError;
pub use format::{format_series, format_snapshot};
pub use indicators::{InsufficientData, IndicatorResult};
pub use snapshot::{
    DailySnapshot, FifteenMinuteSnapshot, FourHourSnapshot, IntradaySnapshot, MarketSnapshot,
    OneHourSnapshot,
};
