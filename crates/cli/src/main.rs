use algo_trade_core::config_loader::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};

mod commands;

use commands::{AnalyzeArgs, DecideArgs, JournalArgs, RunArgs, SnapshotArgs};

#[derive(Parser)]
#[command(name = "algo-trade")]
#[command(about = "AI-assisted decision engine for perpetual futures", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, env = "ALGO_TRADE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every enabled trader until interrupted
    Run(RunArgs),
    /// Print the formatted market data for one symbol
    Snapshot(SnapshotArgs),
    /// Run one decision cycle and print the result
    Decide(DecideArgs),
    /// Match fills into positions and print performance
    Analyze(AnalyzeArgs),
    /// List prompt templates
    Prompts,
    /// Show or prune a trader's decision journal
    Journal(JournalArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => commands::run_traders(&cli.config, args).await?,
        Commands::Snapshot(args) => commands::run_snapshot(&cli.config, args).await?,
        Commands::Decide(args) => commands::run_decide(&cli.config, args).await?,
        Commands::Analyze(args) => commands::run_analyze(&cli.config, args).await?,
        Commands::Prompts => commands::run_prompts(&cli.config)?,
        Commands::Journal(args) => commands::run_journal(&cli.config, args)?,
    }

    Ok(())
}
