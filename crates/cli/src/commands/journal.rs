use algo_trade_decision::{DecisionJournal, DecisionRecord};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;

use super::services::{find_trader, load_config};

#[derive(Args, Debug, Clone)]
pub struct JournalArgs {
    /// Trader whose journal to read (defaults to the first one)
    #[arg(long)]
    pub trader: Option<String>,

    /// Only records from this UTC date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Number of most recent records to show
    #[arg(long, default_value_t = 10)]
    pub latest: usize,

    /// Delete records older than this many days instead of listing
    #[arg(long)]
    pub clean_days: Option<i64>,
}

/// Lists or prunes a trader's decision journal.
///
/// # Errors
/// Returns an error if the journal directory cannot be read.
pub fn run_journal(config_path: &str, args: JournalArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let trader = find_trader(&config, args.trader.as_deref())?;
    let journal = DecisionJournal::open(&trader.journal_dir)
        .with_context(|| format!("Failed to open journal {}", trader.journal_dir))?;

    if let Some(days) = args.clean_days {
        let removed = journal.clean_old_records(days)?;
        println!("Removed {removed} records older than {days} days");
        return Ok(());
    }

    let records = match args.date {
        Some(date) => journal.records_for_date(date)?,
        None => journal.latest_records(args.latest)?,
    };
    for record in &records {
        println!("{}", summary_line(record));
    }
    Ok(())
}

fn summary_line(record: &DecisionRecord) -> String {
    let outcome = if record.success {
        let actions: Vec<String> = record
            .decisions
            .iter()
            .map(|d| format!("{} {}", d.symbol, d.action))
            .collect();
        if actions.is_empty() {
            "no decisions".to_string()
        } else {
            actions.join(", ")
        }
    } else {
        format!("FAILED: {}", record.error_message)
    };
    format!(
        "#{:<5} {}  equity {:>10.2}  attempts {}  {}",
        record.cycle_number,
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.account_state.total_equity,
        record.attempts.len(),
        outcome
    )
}
