//! Trade statistics over closed positions and Sharpe ratio over equity snapshots.

use std::collections::BTreeMap;

use algo_trade_core::ClosedPosition;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Decision cycles per year at one cycle every 3 minutes.
pub const CYCLES_PER_YEAR: f64 = 175_200.0;

/// Stand-in for an unbounded ratio.
pub const UNBOUNDED_RATIO: f64 = 999.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SymbolPerformance {
    pub symbol: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percentage, 0-100.
    pub win_rate: f64,
    pub total_pnl: Decimal,
    pub avg_pnl: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percentage, 0-100.
    pub win_rate: f64,
    pub avg_win: Decimal,
    /// Negative or zero.
    pub avg_loss: Decimal,
    pub profit_factor: f64,
    pub total_pnl: Decimal,
    pub sharpe_ratio: f64,
    pub symbol_stats: BTreeMap<String, SymbolPerformance>,
    pub best_symbol: Option<String>,
    pub worst_symbol: Option<String>,
}

pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    /// Summary over `positions`, with Sharpe taken from `equity` snapshots
    /// (oldest first).
    #[must_use]
    pub fn summarize(positions: &[ClosedPosition], equity: &[f64]) -> PerformanceSummary {
        let mut summary = PerformanceSummary::default();
        let mut total_wins = Decimal::ZERO;
        let mut total_losses = Decimal::ZERO;

        for position in positions {
            let pnl = position.net_profit;
            summary.total_trades += 1;
            summary.total_pnl += pnl;

            let stats = summary
                .symbol_stats
                .entry(position.symbol.clone())
                .or_insert_with(|| SymbolPerformance {
                    symbol: position.symbol.clone(),
                    ..SymbolPerformance::default()
                });
            stats.total_trades += 1;
            stats.total_pnl += pnl;

            if pnl > Decimal::ZERO {
                summary.winning_trades += 1;
                stats.winning_trades += 1;
                total_wins += pnl;
            } else if pnl < Decimal::ZERO {
                summary.losing_trades += 1;
                stats.losing_trades += 1;
                total_losses += pnl;
            }
        }

        summary.win_rate = percentage(summary.winning_trades, summary.total_trades);
        if summary.winning_trades > 0 {
            summary.avg_win = total_wins / Decimal::from(summary.winning_trades);
        }
        if summary.losing_trades > 0 {
            summary.avg_loss = total_losses / Decimal::from(summary.losing_trades);
        }
        summary.profit_factor = profit_factor(total_wins, total_losses);

        let mut best: Option<(&str, Decimal)> = None;
        let mut worst: Option<(&str, Decimal)> = None;
        for (symbol, stats) in &mut summary.symbol_stats {
            stats.win_rate = percentage(stats.winning_trades, stats.total_trades);
            stats.avg_pnl = stats.total_pnl / Decimal::from(stats.total_trades.max(1));

            if best.map_or(true, |(_, pnl)| stats.total_pnl > pnl) {
                best = Some((symbol.as_str(), stats.total_pnl));
            }
            if worst.map_or(true, |(_, pnl)| stats.total_pnl < pnl) {
                worst = Some((symbol.as_str(), stats.total_pnl));
            }
        }
        summary.best_symbol = best.map(|(s, _)| s.to_string());
        summary.worst_symbol = worst.map(|(s, _)| s.to_string());

        summary.sharpe_ratio = sharpe_ratio(equity);
        summary
    }
}

/// Annualized Sharpe ratio over consecutive equity snapshots.
///
/// Returns 0 with fewer than two usable snapshots. With zero volatility the
/// ratio is [`UNBOUNDED_RATIO`] for a positive mean and 0 otherwise.
#[must_use]
pub fn sharpe_ratio(equity: &[f64]) -> f64 {
    let returns: Vec<f64> = equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev > 0.0 {
        mean / std_dev * (CYCLES_PER_YEAR / n).sqrt()
    } else if mean > 0.0 {
        UNBOUNDED_RATIO
    } else {
        0.0
    }
}

fn profit_factor(total_wins: Decimal, total_losses: Decimal) -> f64 {
    if total_losses < Decimal::ZERO {
        (total_wins / -total_losses).to_f64().unwrap_or(0.0)
    } else if total_wins > Decimal::ZERO {
        UNBOUNDED_RATIO
    } else {
        0.0
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
