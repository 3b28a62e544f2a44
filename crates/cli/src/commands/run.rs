//! Long-running mode: every enabled trader on its own scan interval.

use algo_trade_bot_orchestrator::TraderRegistry;
use algo_trade_core::ConfigWatcher;
use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::signal::unix::{signal, SignalKind};

use super::services::{load_config, SharedServices};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Only start these trader ids (repeatable). Defaults to every enabled trader.
    #[arg(long = "trader")]
    pub traders: Vec<String>,
}

/// Runs traders until SIGINT or SIGTERM.
///
/// # Errors
/// Returns an error if the configuration is unusable, no trader is selected,
/// or a trader cannot be spawned.
pub async fn run_traders(config_path: &str, args: RunArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let (watcher, config_rx) = ConfigWatcher::new(config_path, config.clone());
    let shared = SharedServices::from_config(&config, config_rx.clone())?;

    let selected: Vec<_> = config
        .traders
        .iter()
        .filter(|t| t.enabled && (args.traders.is_empty() || args.traders.contains(&t.trader_id)))
        .cloned()
        .collect();
    if selected.is_empty() {
        bail!("No enabled traders selected in {config_path}");
    }

    let watcher_task = tokio::spawn(async move {
        if let Err(e) = watcher.watch().await {
            tracing::error!("Config watcher error: {}", e);
        }
    });

    // Templates follow config reloads
    let prompts = shared.prompts.clone();
    let mut reloads = config_rx;
    let prompt_task = tokio::spawn(async move {
        while reloads.changed().await.is_ok() {
            if let Err(e) = prompts.reload() {
                tracing::warn!(error = %e, "Prompt reload failed, keeping previous templates");
            }
        }
    });

    let registry = TraderRegistry::new();
    for trader in &selected {
        registry
            .spawn_trader(trader.clone(), shared.for_trader(trader))
            .await
            .with_context(|| format!("Failed to spawn trader {}", trader.trader_id))?;
    }
    registry.start_all().await?;
    tracing::info!(traders = ?registry.list_traders().await, "Traders running");

    shutdown_signal().await?;

    tracing::info!("Shutting down all traders...");
    for status in registry.statuses().await {
        tracing::info!(
            trader_id = %status.trader_id,
            cycles = status.cycle_count,
            equity = ?status.total_equity,
            sharpe = ?status.last_sharpe,
            "Final trader status"
        );
    }
    if let Err(e) = registry.shutdown_all().await {
        tracing::error!("Error during trader shutdown: {}", e);
    }
    prompt_task.abort();
    watcher_task.abort();

    tracing::info!("Trading system stopped");
    Ok(())
}

async fn shutdown_signal() -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
    }
    Ok(())
}
