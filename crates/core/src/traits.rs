use crate::account::{AccountState, PositionInfo};
use crate::candle::{Candle, OpenInterest, Timeframe};
use crate::decision::Decision;
use crate::fill::Fill;
use anyhow::Result;
use async_trait::async_trait;

/// Market-data feed for candles, open interest and funding.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Returns up to `limit` most recent bars, ascending by open time.
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>>;
    async fn fetch_open_interest(&self, symbol: &str) -> Result<OpenInterest>;
    /// Last funding rate as a decimal fraction.
    async fn fetch_funding_rate(&self, symbol: &str) -> Result<f64>;
}

/// Text-generation endpoint taking a system and a user prompt.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Read access to the trading account.
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn account_state(&self) -> Result<AccountState>;
    async fn open_positions(&self) -> Result<Vec<PositionInfo>>;
}

/// Receives validated decisions for execution and reports what happened.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn submit(&self, decisions: &[Decision]) -> Result<Vec<String>>;
}

/// Ordered read access to every recorded fill.
#[async_trait]
pub trait FillLedger: Send + Sync {
    async fn fills(&self) -> Result<Vec<Fill>>;
}
