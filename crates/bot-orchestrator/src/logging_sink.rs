use algo_trade_core::{Action, Decision, DecisionSink};
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Decision sink that only records what it was asked to do.
///
/// Stands in for order execution in paper mode. Decisions are reported in
/// [`execution_order`].
#[derive(Debug, Clone)]
pub struct LoggingSink {
    trader_id: String,
}

impl LoggingSink {
    #[must_use]
    pub fn new(trader_id: impl Into<String>) -> Self {
        Self {
            trader_id: trader_id.into(),
        }
    }
}

#[async_trait]
impl DecisionSink for LoggingSink {
    async fn submit(&self, decisions: &[Decision]) -> Result<Vec<String>> {
        let mut log = Vec::with_capacity(decisions.len());
        for d in execution_order(decisions) {
            let line = match d.action {
                Action::Hold | Action::Wait => format!("{} {}: no action", d.symbol, d.action),
                _ if d.action.is_open() => format!(
                    "{} {}: {:.2} USD at {}x, stop {} target {} (paper)",
                    d.symbol, d.action, d.position_size_usd, d.leverage, d.stop_loss, d.take_profit
                ),
                Action::MoveSlToBreakeven => {
                    format!("{} {}: stop to {} (paper)", d.symbol, d.action, d.new_stop_loss)
                }
                _ => format!("{} {} (paper)", d.symbol, d.action),
            };
            info!(trader_id = %self.trader_id, symbol = %d.symbol, action = %d.action, "{line}");
            log.push(line);
        }
        Ok(log)
    }
}

/// Closes, then stop moves, then opens. Hold and wait go last.
#[must_use]
pub fn execution_order(decisions: &[Decision]) -> Vec<&Decision> {
    let mut ordered: Vec<&Decision> = decisions.iter().collect();
    ordered.sort_by_key(|d| match d.action {
        Action::CloseLong | Action::CloseShort | Action::PartialCloseLong | Action::PartialCloseShort => 0,
        Action::MoveSlToBreakeven => 1,
        Action::OpenLong | Action::OpenShort => 2,
        Action::Hold | Action::Wait | Action::Unknown(_) => 3,
    });
    ordered
}
