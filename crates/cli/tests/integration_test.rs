//! Runs the `algo-trade` binary against files in a temporary directory.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const FILLS: &str = "trade_id,order_id,symbol,price,quantity,commission,commission_asset,is_buyer,is_maker,timestamp
1,101,BTCUSDT,100,1.0,0.1,USDT,true,false,2025-01-01T00:00:00Z
2,102,BTCUSDT,110,0.4,0.05,USDT,false,false,2025-01-01T00:01:00Z
3,103,BTCUSDT,90,0.6,0.05,USDT,false,false,2025-01-01T00:02:00Z
";

fn algo_trade(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_algo-trade"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("ALGO_TRADE_CONFIG")
        .output()
        .expect("failed to run algo-trade")
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let prompts = dir.path().join("prompts");
    std::fs::create_dir(&prompts).unwrap();
    std::fs::write(prompts.join("momentum.txt"), "Momentum Hunter\nRide the 4h trend.\n").unwrap();
    std::fs::write(prompts.join("notes.md"), "ignored").unwrap();

    let config = format!(
        "prompts_dir = \"{}\"\n\n[[traders]]\ntrader_id = \"alpha\"\nprompt_template = \"momentum\"\njournal_dir = \"{}\"\n",
        prompts.display(),
        dir.path().join("journal").display()
    );
    std::fs::write(dir.path().join("Config.toml"), config).unwrap();
    std::fs::write(dir.path().join("fills.csv"), FILLS).unwrap();
    dir
}

#[test]
fn test_analyze_reference_fills() {
    let dir = workspace();
    let fills = dir.path().join("fills.csv");
    let output = algo_trade(
        &dir.path().join("Config.toml"),
        &["analyze", "--fills", fills.to_str().unwrap()],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Trades:        2 (1 wins / 1 losses)"), "{stdout}");
    assert!(stdout.contains("Total P&L:     -2.20"), "{stdout}");
    assert!(stdout.contains("3.91"));
    assert!(stdout.contains("-6.11"));
    assert!(!stdout.contains("Open lots"));
}

#[test]
fn test_analyze_json_summary() {
    let dir = workspace();
    let fills = dir.path().join("fills.csv");
    let output = algo_trade(
        &dir.path().join("Config.toml"),
        &["analyze", "--fills", fills.to_str().unwrap(), "--json"],
    );

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total_trades"], 2);
    assert_eq!(summary["best_symbol"], "BTCUSDT");
}

#[test]
fn test_prompt_analysis_needs_journal() {
    let dir = workspace();
    let fills = dir.path().join("fills.csv");
    let output = algo_trade(
        &dir.path().join("Config.toml"),
        &["analyze", "--fills", fills.to_str().unwrap(), "--prompt", "momentum"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--prompt requires --journal"));
}

#[test]
fn test_prompts_listing() {
    let dir = workspace();
    let output = algo_trade(&dir.path().join("Config.toml"), &["prompts"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("momentum"));
    assert!(stdout.contains("Momentum Hunter"));
    assert!(!stdout.contains("notes"));
    assert!(stdout.contains("alpha -> momentum"));
}

#[test]
fn test_empty_journal_lists_nothing() {
    let dir = workspace();
    let output = algo_trade(&dir.path().join("Config.toml"), &["journal", "--latest", "5"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());
}
