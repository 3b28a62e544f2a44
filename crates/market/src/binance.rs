//! REST client for Binance USD-M futures market data.
//!
//! Covers the three public endpoints the snapshot builder needs: klines,
//! open interest and the premium index (funding). Every request waits on a
//! shared rate limiter first.

use std::num::NonZeroU32;
use std::time::Duration;

use algo_trade_core::{Candle, CandleSource, MarketConfig, OpenInterest, Timeframe};
use anyhow::Context;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MarketDataError, Result};

/// Binance Futures API base URL
pub const BINANCE_FUTURES_API: &str = "https://fapi.binance.com";

const DEFAULT_RATE_LIMIT_PER_SECOND: u32 = 20;

/// The feed has no rolling OI average; approximate it from the latest value.
const OI_AVERAGE_FACTOR: f64 = 0.999;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

pub struct BinanceFuturesClient {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: DirectLimiter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenInterestResponse {
    open_interest: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndexResponse {
    last_funding_rate: String,
}

impl BinanceFuturesClient {
    /// Client against the public endpoint with default limits.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(BINANCE_FUTURES_API, DEFAULT_RATE_LIMIT_PER_SECOND, Duration::from_secs(30))
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the rate is zero.
    pub fn from_config(config: &MarketConfig) -> Result<Self> {
        Self::with_config(
            &config.api_url,
            config.rate_limit_per_second,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// # Arguments
    /// * `base_url` - Base URL for the futures API
    /// * `rate_limit_per_second` - Maximum requests per second, must be > 0
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the rate is zero.
    pub fn with_config(base_url: &str, rate_limit_per_second: u32, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketDataError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let rate = NonZeroU32::new(rate_limit_per_second).ok_or_else(|| {
            MarketDataError::Configuration("rate limit must be > 0".to_string())
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::direct(Quota::per_second(rate)),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Most recent `limit` klines for `symbol`, ascending by open time.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or a body
    /// that is not a well-ordered kline array.
    pub async fn klines(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let rows: Vec<Vec<Value>> = self
            .get_json(
                "/fapi/v1/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", timeframe.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let total = rows.len();
        let candles: Vec<Candle> = rows.iter().filter_map(|row| parse_kline(row)).collect();
        if candles.len() < total {
            tracing::debug!(
                symbol,
                timeframe = %timeframe,
                dropped = total - candles.len(),
                "Skipped unparsable klines"
            );
        }

        if !algo_trade_core::is_well_ordered(&candles) {
            return Err(MarketDataError::malformed("klines", "bars are not strictly ascending"));
        }
        Ok(candles)
    }

    /// # Errors
    /// Returns an error on transport failure or an unparsable body.
    pub async fn open_interest(&self, symbol: &str) -> Result<OpenInterest> {
        let body: OpenInterestResponse = self
            .get_json("/fapi/v1/openInterest", &[("symbol", symbol.to_string())])
            .await?;
        let latest = parse_number("openInterest", &body.open_interest)?;
        Ok(OpenInterest {
            latest,
            average: latest * OI_AVERAGE_FACTOR,
        })
    }

    /// # Errors
    /// Returns an error on transport failure or an unparsable body.
    pub async fn funding_rate(&self, symbol: &str) -> Result<f64> {
        let body: PremiumIndexResponse = self
            .get_json("/fapi/v1/premiumIndex", &[("symbol", symbol.to_string())])
            .await?;
        parse_number("premiumIndex", &body.last_funding_rate)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &'static str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MarketDataError::api(status.as_u16(), error_text));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| MarketDataError::malformed(path, e.to_string()))
    }
}

#[async_trait]
impl CandleSource for BinanceFuturesClient {
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> anyhow::Result<Vec<Candle>> {
        self.klines(symbol, timeframe, limit)
            .await
            .with_context(|| format!("Failed to fetch {timeframe} klines for {symbol}"))
    }

    async fn fetch_open_interest(&self, symbol: &str) -> anyhow::Result<OpenInterest> {
        self.open_interest(symbol)
            .await
            .with_context(|| format!("Failed to fetch open interest for {symbol}"))
    }

    async fn fetch_funding_rate(&self, symbol: &str) -> anyhow::Result<f64> {
        self.funding_rate(symbol)
            .await
            .with_context(|| format!("Failed to fetch funding rate for {symbol}"))
    }
}

/// Parses one kline row.
///
/// ```text
/// [
///   1499040000000,      // 0: Open time
///   "0.01634000",       // 1: Open
///   "0.80000000",       // 2: High
///   "0.01575800",       // 3: Low
///   "0.01577100",       // 4: Close
///   "148976.11427815",  // 5: Volume
///   1499644799999,      // 6: Close time
///   ...
/// ]
/// ```
fn parse_kline(row: &[Value]) -> Option<Candle> {
    if row.len() < 7 {
        return None;
    }
    Some(Candle {
        open_time: row[0].as_i64()?,
        open: parse_f64_from_json(&row[1])?,
        high: parse_f64_from_json(&row[2])?,
        low: parse_f64_from_json(&row[3])?,
        close: parse_f64_from_json(&row[4])?,
        volume: parse_f64_from_json(&row[5])?,
        close_time: row[6].as_i64()?,
    })
}

/// Accepts both string and number encodings.
fn parse_f64_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64> {
    raw.parse()
        .map_err(|_| MarketDataError::malformed(field, format!("not a number: '{raw}'")))
}
