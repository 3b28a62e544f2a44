//! Collaborators shared by every trader in one process.

use std::path::Path;
use std::sync::Arc;

use algo_trade_bot_orchestrator::{LoggingSink, PaperAccount, TraderServices};
use algo_trade_core::{AppConfig, CandleSource, ConfigLoader, ReasoningClient, TraderConfig};
use algo_trade_decision::{LlmClient, PromptRepository};
use algo_trade_market::BinanceFuturesClient;
use anyhow::{anyhow, Context, Result};
use tokio::sync::watch;

pub struct SharedServices {
    pub candles: Arc<dyn CandleSource>,
    pub reasoning: Arc<dyn ReasoningClient>,
    pub prompts: Arc<PromptRepository>,
    pub app_config: watch::Receiver<AppConfig>,
}

impl SharedServices {
    /// # Errors
    /// Fails when either HTTP client cannot be built, e.g. a missing API key.
    pub fn from_config(config: &AppConfig, app_config: watch::Receiver<AppConfig>) -> Result<Self> {
        let candles = BinanceFuturesClient::from_config(&config.market)
            .context("Failed to create market data client")?;
        let reasoning =
            LlmClient::from_config(&config.reasoning).context("Failed to create reasoning client")?;
        tracing::info!(
            provider = ?config.reasoning.provider,
            model = reasoning.model(),
            endpoint = reasoning.endpoint(),
            "Reasoning client ready"
        );

        Ok(Self {
            candles: Arc::new(candles),
            reasoning: Arc::new(reasoning),
            prompts: Arc::new(load_prompts(&config.prompts_dir)),
            app_config,
        })
    }

    /// Paper account and logging sink for one trader, everything else shared.
    #[must_use]
    pub fn for_trader(&self, trader: &TraderConfig) -> TraderServices {
        TraderServices {
            candles: Arc::clone(&self.candles),
            reasoning: Arc::clone(&self.reasoning),
            account: Arc::new(PaperAccount::new(trader.initial_equity)),
            sink: Arc::new(LoggingSink::new(trader.trader_id.clone())),
            prompts: Arc::clone(&self.prompts),
            app_config: self.app_config.clone(),
        }
    }
}

/// # Errors
/// Returns an error if the configuration cannot be parsed.
pub fn load_config(path: &str) -> Result<AppConfig> {
    ConfigLoader::load_from(path).with_context(|| format!("Failed to load configuration from {path}"))
}

/// Templates from `dir`, or none when the directory is missing.
pub fn load_prompts(dir: &str) -> PromptRepository {
    if !Path::new(dir).is_dir() {
        tracing::warn!(dir, "Prompt directory not found, using base rules only");
        return PromptRepository::empty();
    }
    PromptRepository::load(dir).unwrap_or_else(|e| {
        tracing::warn!(dir, error = %e, "Failed to load prompt templates");
        PromptRepository::empty()
    })
}

/// The named trader, or the first configured one, or the defaults.
///
/// # Errors
/// Fails when `trader_id` is given but not configured.
pub fn find_trader(config: &AppConfig, trader_id: Option<&str>) -> Result<TraderConfig> {
    match trader_id {
        Some(id) => config
            .traders
            .iter()
            .find(|t| t.trader_id == id)
            .cloned()
            .ok_or_else(|| anyhow!("Trader '{id}' is not configured")),
        None => Ok(config.traders.first().cloned().unwrap_or_default()),
    }
}
