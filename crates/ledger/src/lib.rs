//! Realized trading performance.
//!
//! Raw fills are turned into closed round trips by the FIFO
//! [`PositionMatcher`], then summarized by the [`PerformanceAnalyzer`]. The
//! Sharpe ratio it reports feeds the next decision cycle.

pub mod fill_store;
pub mod matcher;
pub mod performance;
pub mod prompt_analysis;

pub use fill_store::CsvFillLedger;
pub use matcher::{MatchReport, OpenLot, PositionMatcher};
pub use performance::{
    sharpe_ratio, PerformanceAnalyzer, PerformanceSummary, SymbolPerformance, CYCLES_PER_YEAR,
    UNBOUNDED_RATIO,
};
pub use prompt_analysis::{analyze_prompt, PromptPerformance};
