//! Concurrent snapshot construction across symbols and timeframes.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use algo_trade_core::{normalize_symbol, Candle, CandleSource, MarketConfig, Timeframe};
use anyhow::{bail, Result};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::snapshot::{
    change_vs_previous_close, DailySnapshot, FifteenMinuteSnapshot, FourHourSnapshot,
    IntradaySnapshot, MarketSnapshot, OneHourSnapshot,
};

/// Fetches candles for every timeframe of every symbol and assembles snapshots.
pub struct MarketSnapshotBuilder {
    source: Arc<dyn CandleSource>,
    candle_limit: usize,
    liquidity_floor_usd: f64,
}

/// Outcome of one universe build: snapshots kept plus the symbols filtered out.
#[derive(Debug, Clone, Default)]
pub struct UniverseSnapshot {
    pub snapshots: BTreeMap<String, MarketSnapshot>,
    pub illiquid: Vec<String>,
    pub unavailable: Vec<String>,
}

impl MarketSnapshotBuilder {
    pub fn new(source: Arc<dyn CandleSource>, config: &MarketConfig) -> Self {
        Self {
            source,
            candle_limit: config.candle_limit,
            liquidity_floor_usd: config.liquidity_floor_usd,
        }
    }

    #[must_use]
    pub fn with_liquidity_floor(mut self, floor_usd: f64) -> Self {
        self.liquidity_floor_usd = floor_usd;
        self
    }

    /// Snapshot for one symbol, or `None` when no current price is available.
    ///
    /// Timeframe, OI and funding failures are logged and leave the matching
    /// field empty. Only a missing 3m series drops the symbol.
    pub async fn snapshot(&self, symbol: &str) -> Option<MarketSnapshot> {
        let symbol = normalize_symbol(symbol);

        let fetches = Timeframe::ALL.map(|tf| self.fetch_timeframe(&symbol, tf));
        let (series, oi, funding) = tokio::join!(
            join_all(fetches),
            self.source.fetch_open_interest(&symbol),
            self.source.fetch_funding_rate(&symbol),
        );
        let [three_m, fifteen_m, one_h, four_h, one_d]: [Option<Vec<Candle>>; 5] =
            match series.try_into() {
                Ok(array) => array,
                Err(_) => return None,
            };

        let Some(current_price) = three_m.as_ref().and_then(|c| c.last()).map(|c| c.close) else {
            warn!(symbol = %symbol, timeframe = "3m", "No current price, skipping symbol");
            return None;
        };

        let open_interest = oi
            .map_err(|e| warn!(symbol = %symbol, "Open interest unavailable: {:#}", e))
            .ok();
        let funding_rate = funding
            .map_err(|e| warn!(symbol = %symbol, "Funding rate unavailable: {:#}", e))
            .ok();

        let price_change_1h = one_h
            .as_deref()
            .map_or(0.0, |c| change_vs_previous_close(c, current_price));
        let price_change_4h = four_h
            .as_deref()
            .map_or(0.0, |c| change_vs_previous_close(c, current_price));

        Some(MarketSnapshot {
            symbol,
            current_price,
            price_change_1h,
            price_change_4h,
            intraday: three_m.as_deref().map(IntradaySnapshot::from_candles),
            fifteen_minute: fifteen_m.as_deref().map(FifteenMinuteSnapshot::from_candles),
            one_hour: one_h.as_deref().map(OneHourSnapshot::from_candles),
            four_hour: four_h.as_deref().map(FourHourSnapshot::from_candles),
            daily: one_d.as_deref().map(DailySnapshot::from_candles),
            open_interest,
            funding_rate,
        })
    }

    /// Builds snapshots for held positions and candidates concurrently.
    ///
    /// Held symbols always survive the liquidity filter.
    ///
    /// # Errors
    /// Fails when not a single symbol produced a snapshot.
    pub async fn build_universe(&self, held: &[String], candidates: &[String]) -> Result<UniverseSnapshot> {
        let held: BTreeSet<String> = held.iter().map(|s| normalize_symbol(s)).collect();
        let mut universe: Vec<String> = held.iter().cloned().collect();
        for symbol in candidates.iter().map(|s| normalize_symbol(s)) {
            if !universe.contains(&symbol) {
                universe.push(symbol);
            }
        }

        let results = join_all(universe.iter().map(|s| self.snapshot(s))).await;

        let mut out = UniverseSnapshot::default();
        let mut fetched = 0usize;
        for (symbol, result) in universe.iter().zip(results) {
            let Some(snapshot) = result else {
                out.unavailable.push(symbol.clone());
                continue;
            };
            fetched += 1;

            if !held.contains(symbol) && !snapshot.meets_liquidity_floor(self.liquidity_floor_usd) {
                info!(
                    symbol = %symbol,
                    oi_notional = snapshot.open_interest_notional().unwrap_or_default(),
                    floor = self.liquidity_floor_usd,
                    "Open interest below liquidity floor, skipping candidate"
                );
                out.illiquid.push(symbol.clone());
                continue;
            }
            out.snapshots.insert(symbol.clone(), snapshot);
        }

        if fetched == 0 {
            bail!("No market data available for any of {} symbols", universe.len());
        }

        debug!(
            kept = out.snapshots.len(),
            illiquid = out.illiquid.len(),
            unavailable = out.unavailable.len(),
            "Market universe built"
        );
        Ok(out)
    }

    async fn fetch_timeframe(&self, symbol: &str, timeframe: Timeframe) -> Option<Vec<Candle>> {
        match self.source.fetch_candles(symbol, timeframe, self.candle_limit).await {
            Ok(candles) if candles.is_empty() => {
                warn!(symbol, timeframe = %timeframe, "Empty candle series");
                None
            }
            Ok(candles) => Some(candles),
            Err(e) => {
                warn!(symbol, timeframe = %timeframe, "Candle fetch failed: {:#}", e);
                None
            }
        }
    }
}
