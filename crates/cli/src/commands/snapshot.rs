use std::sync::Arc;

use algo_trade_core::normalize_symbol;
use algo_trade_market::{format_snapshot, BinanceFuturesClient, MarketSnapshotBuilder};
use anyhow::{anyhow, Result};
use clap::Args;

use super::services::load_config;

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Symbol, e.g. "BTC" or "ETHUSDT"
    #[arg(long)]
    pub symbol: String,
}

/// Prints the formatted market data for one symbol.
///
/// # Errors
/// Returns an error if the client cannot be built or no price is available.
pub async fn run_snapshot(config_path: &str, args: SnapshotArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let symbol = normalize_symbol(&args.symbol);

    let client = BinanceFuturesClient::from_config(&config.market)?;
    let builder = MarketSnapshotBuilder::new(Arc::new(client), &config.market);
    let snapshot = builder
        .snapshot(&symbol)
        .await
        .ok_or_else(|| anyhow!("No market data available for {symbol}"))?;

    let missing = snapshot.missing_timeframes();
    if !missing.is_empty() {
        tracing::warn!(symbol = %symbol, missing = ?missing, "Snapshot is missing timeframes");
    }
    println!("{}", format_snapshot(&snapshot));
    Ok(())
}
