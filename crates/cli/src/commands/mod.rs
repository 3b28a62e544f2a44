//! CLI subcommands for the decision engine.

pub mod analyze;
pub mod decide;
pub mod journal;
pub mod prompts;
pub mod run;
pub mod services;
pub mod snapshot;

pub use analyze::{run_analyze, AnalyzeArgs};
pub use decide::{run_decide, DecideArgs};
pub use journal::{run_journal, JournalArgs};
pub use prompts::run_prompts;
pub use run::{run_traders, RunArgs};
pub use snapshot::{run_snapshot, SnapshotArgs};
