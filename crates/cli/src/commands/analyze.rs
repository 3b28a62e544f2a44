//! Realized performance from a fill ledger, optionally attributed to one prompt.

use std::fmt::Write as _;
use std::path::PathBuf;

use algo_trade_core::{ClosedPosition, FillLedger};
use algo_trade_decision::DecisionJournal;
use algo_trade_ledger::{analyze_prompt, CsvFillLedger, PerformanceAnalyzer, PerformanceSummary, PositionMatcher};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::Args;

use super::services::{load_config, load_prompts};

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// CSV fill ledger
    #[arg(long)]
    pub fills: PathBuf,

    /// Decision journal directory; supplies the equity history for Sharpe
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Restrict to fills made under this prompt template (requires --journal)
    #[arg(long)]
    pub prompt: Option<String>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// # Errors
/// Returns an error if the ledger or journal cannot be read, or the prompt
/// template is unknown.
pub async fn run_analyze(config_path: &str, args: AnalyzeArgs) -> Result<()> {
    let fills = CsvFillLedger::new(&args.fills).fills().await?;
    tracing::info!(fills = fills.len(), path = %args.fills.display(), "Loaded fills");

    let journal = args
        .journal
        .as_ref()
        .map(DecisionJournal::open)
        .transpose()
        .context("Failed to open decision journal")?;

    if let Some(prompt_id) = &args.prompt {
        let Some(journal) = &journal else {
            bail!("--prompt requires --journal");
        };
        let config = load_config(config_path)?;
        let template = load_prompts(&config.prompts_dir)
            .get(prompt_id)
            .ok_or_else(|| anyhow!("Unknown prompt template '{prompt_id}'"))?;
        let times: Vec<_> = journal
            .records_for_template(&template.content)?
            .iter()
            .map(|r| r.timestamp)
            .collect();

        let result = analyze_prompt(prompt_id, &times, &fills, Utc::now());
        if args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("Prompt '{}': {} decision cycles", result.prompt_id, result.decision_windows);
            print!("{}", render_summary(&result.summary, false));
        }
        return Ok(());
    }

    let report = PositionMatcher::match_with_report(&fills);
    let equity = match &journal {
        Some(journal) => journal.equity_series(usize::MAX)?,
        None => Vec::new(),
    };
    let summary = PerformanceAnalyzer::summarize(&report.closed, &equity);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    print!("{}", render_positions(&report.closed));
    if !report.open_lots.is_empty() {
        println!("\nOpen lots:");
        for lot in &report.open_lots {
            println!("  {} {} {} @ {}", lot.symbol, lot.side.as_str(), lot.remaining_quantity, lot.price);
        }
    }
    print!("{}", render_summary(&summary, !equity.is_empty()));
    Ok(())
}

fn render_positions(positions: &[ClosedPosition]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<20} {:>10} {:>12} {:>12} {:>10} {:>12} {:>10}",
        "Symbol", "Closed", "Qty", "Open", "Close", "Fees", "Net P&L", "Held"
    );
    for p in positions {
        let _ = writeln!(
            out,
            "{:<12} {:<20} {:>10} {:>12} {:>12} {:>10} {:>12} {:>10}",
            p.symbol,
            p.close_time.format("%Y-%m-%d %H:%M:%S"),
            p.matched_quantity.normalize(),
            p.avg_open_price.round_dp(4),
            p.avg_close_price.round_dp(4),
            p.total_fees.round_dp(4),
            p.net_profit.round_dp(4),
            p.duration_label()
        );
    }
    out
}

fn render_summary(summary: &PerformanceSummary, with_sharpe: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== Performance ===");
    let _ = writeln!(
        out,
        "Trades:        {} ({} wins / {} losses)",
        summary.total_trades, summary.winning_trades, summary.losing_trades
    );
    let _ = writeln!(out, "Win rate:      {:.2}%", summary.win_rate);
    let _ = writeln!(out, "Total P&L:     {}", summary.total_pnl.round_dp(4));
    let _ = writeln!(out, "Avg win:       {}", summary.avg_win.round_dp(4));
    let _ = writeln!(out, "Avg loss:      {}", summary.avg_loss.round_dp(4));
    let _ = writeln!(out, "Profit factor: {:.2}", summary.profit_factor);
    if with_sharpe {
        let _ = writeln!(out, "Sharpe:        {:.2}", summary.sharpe_ratio);
    }
    if let (Some(best), Some(worst)) = (&summary.best_symbol, &summary.worst_symbol) {
        let _ = writeln!(out, "Best symbol:   {best}");
        let _ = writeln!(out, "Worst symbol:  {worst}");
    }
    if !summary.symbol_stats.is_empty() {
        let _ = writeln!(out, "\n{:<12} {:>7} {:>9} {:>12}", "Symbol", "Trades", "Win %", "P&L");
        for stats in summary.symbol_stats.values() {
            let _ = writeln!(
                out,
                "{:<12} {:>7} {:>8.1}% {:>12}",
                stats.symbol,
                stats.total_trades,
                stats.win_rate,
                stats.total_pnl.round_dp(4)
            );
        }
    }
    out
}
