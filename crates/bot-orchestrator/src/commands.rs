use algo_trade_decision::DecisionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum TraderCommand {
    Start,
    Stop,
    /// Runs one decision cycle now, regardless of state, and replies with its record.
    RunCycle(oneshot::Sender<DecisionRecord>),
    /// Switches the prompt template used from the next cycle on.
    SetPrompt(Option<String>),
    GetStatus(oneshot::Sender<TraderStatus>),
    Shutdown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TraderState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderStatus {
    pub trader_id: String,
    pub state: TraderState,
    pub prompt_template: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub cycle_count: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_cycle_success: Option<bool>,
    pub last_error: Option<String>,
    pub last_sharpe: Option<f64>,
    pub total_equity: Option<f64>,
}

impl TraderStatus {
    #[must_use]
    pub fn stopped(trader_id: impl Into<String>, prompt_template: Option<String>) -> Self {
        Self {
            trader_id: trader_id.into(),
            state: TraderState::Stopped,
            prompt_template,
            started_at: None,
            cycle_count: 0,
            last_cycle_at: None,
            last_cycle_success: None,
            last_error: None,
            last_sharpe: None,
            total_equity: None,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TraderState::Running
    }
}
