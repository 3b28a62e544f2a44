//! Performance attributed to the decision cycles of one prompt template.
//!
//! Each cycle owns the fills strictly between its own timestamp and the next
//! cycle's (the last cycle runs until `now`). Fills are matched inside their
//! window only, so a position opened under one cycle and closed under another
//! is not counted.

use algo_trade_core::Fill;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::matcher::PositionMatcher;
use crate::performance::{PerformanceAnalyzer, PerformanceSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptPerformance {
    pub prompt_id: String,
    pub decision_windows: usize,
    pub summary: PerformanceSummary,
}

/// Matches fills per decision window and aggregates the result.
///
/// `decision_times` must be ascending.
#[must_use]
pub fn analyze_prompt(
    prompt_id: &str,
    decision_times: &[DateTime<Utc>],
    fills: &[Fill],
    now: DateTime<Utc>,
) -> PromptPerformance {
    let mut positions = Vec::new();
    for (i, start) in decision_times.iter().enumerate() {
        let end = decision_times.get(i + 1).copied().unwrap_or(now);
        let window: Vec<Fill> = fills
            .iter()
            .filter(|f| f.timestamp > *start && f.timestamp < end)
            .cloned()
            .collect();
        let closed = PositionMatcher::match_positions(&window);
        debug!(prompt_id, window = i, fills = window.len(), closed = closed.len(), "Analyzed decision window");
        positions.extend(closed);
    }

    PromptPerformance {
        prompt_id: prompt_id.to_string(),
        decision_windows: decision_times.len(),
        summary: PerformanceAnalyzer::summarize(&positions, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap()
    }

    fn fill(trade_id: i64, is_buyer: bool, price: Decimal, minute: u32) -> Fill {
        Fill {
            trade_id,
            order_id: trade_id,
            symbol: "BTCUSDT".to_string(),
            price,
            quantity: dec!(1),
            commission: dec!(0),
            commission_asset: "USDT".to_string(),
            is_buyer,
            is_maker: true,
            timestamp: at(minute),
        }
    }

    #[test]
    fn test_fills_bucketed_by_window() {
        let fills = vec![
            fill(1, true, dec!(100), 1),
            fill(2, false, dec!(110), 2),
            // crosses the cycle boundary at minute 10, never matched
            fill(3, true, dec!(100), 8),
            fill(4, false, dec!(90), 12),
            fill(5, true, dec!(100), 13),
            fill(6, false, dec!(95), 14),
        ];
        let result = analyze_prompt("trend", &[at(0), at(10)], &fills, at(30));

        assert_eq!(result.decision_windows, 2);
        assert_eq!(result.summary.total_trades, 2);
        // +10 long in the first window, -10 short in the second
        assert_eq!(result.summary.total_pnl, dec!(0));
        assert_eq!(result.summary.winning_trades, 1);
        assert_eq!(result.summary.losing_trades, 1);
    }

    #[test]
    fn test_window_bounds_are_exclusive() {
        let fills = vec![fill(1, true, dec!(100), 0), fill(2, false, dec!(110), 5)];
        let result = analyze_prompt("edge", &[at(0)], &fills, at(5));
        assert_eq!(result.summary.total_trades, 0);
    }

    #[test]
    fn test_no_cycles() {
        let result = analyze_prompt("unused", &[], &[fill(1, true, dec!(1), 0)], at(1));
        assert_eq!(result.summary.total_trades, 0);
        assert_eq!(result.decision_windows, 0);
    }
}
