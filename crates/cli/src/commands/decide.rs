use algo_trade_bot_orchestrator::TraderRegistry;
use algo_trade_decision::DecisionRecord;
use anyhow::{bail, Result};
use clap::Args;
use tokio::sync::watch;

use super::services::{find_trader, load_config, SharedServices};

#[derive(Args, Debug, Clone)]
pub struct DecideArgs {
    /// Trader id from the configuration (defaults to the first one)
    #[arg(long)]
    pub trader: Option<String>,

    /// Print the full journal record as JSON
    #[arg(long)]
    pub json: bool,
}

/// Runs a single decision cycle and prints the outcome.
///
/// # Errors
/// Returns an error if the trader cannot be set up or the cycle produced no
/// valid decision.
pub async fn run_decide(config_path: &str, args: DecideArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let trader = find_trader(&config, args.trader.as_deref())?;
    let (_config_tx, config_rx) = watch::channel(config.clone());
    let shared = SharedServices::from_config(&config, config_rx)?;

    let registry = TraderRegistry::new();
    let handle = registry.spawn_trader(trader.clone(), shared.for_trader(&trader)).await?;
    let record = handle.run_cycle().await?;
    registry.shutdown_all().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }

    if !record.success {
        bail!("Cycle #{} failed: {}", record.cycle_number, record.error_message);
    }
    Ok(())
}

fn print_record(record: &DecisionRecord) {
    println!("Cycle #{} at {}", record.cycle_number, record.timestamp.format("%Y-%m-%d %H:%M:%S"));
    println!("Attempts: {}", record.attempts.len());
    if !record.cot_trace.is_empty() {
        println!("\n--- Reasoning ---\n{}", record.cot_trace);
    }
    if record.success {
        println!("\n--- Decisions ---");
        for d in &record.decisions {
            if d.action.is_open() {
                println!(
                    "{:<12} {:<20} {:>3}x {:>10.2} USD  SL {}  TP {}  conf {}",
                    d.symbol, d.action, d.leverage, d.position_size_usd, d.stop_loss, d.take_profit, d.confidence
                );
            } else {
                println!("{:<12} {}", d.symbol, d.action);
            }
        }
        println!("\n--- Execution ---");
        for line in &record.execution_log {
            println!("{line}");
        }
    }
}
