//! Decision records proposed by the reasoning model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action requested for one symbol.
///
/// Model output is free text, so any string outside the known set
/// deserializes into [`Action::Unknown`] and is rejected during validation
/// instead of failing the whole JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
    PartialCloseLong,
    PartialCloseShort,
    Hold,
    Wait,
    MoveSlToBreakeven,
    Unknown(String),
}

impl Action {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenLong => "open_long",
            Self::OpenShort => "open_short",
            Self::CloseLong => "close_long",
            Self::CloseShort => "close_short",
            Self::PartialCloseLong => "partial_close_long",
            Self::PartialCloseShort => "partial_close_short",
            Self::Hold => "hold",
            Self::Wait => "wait",
            Self::MoveSlToBreakeven => "move_sl_to_breakeven",
            Self::Unknown(raw) => raw,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::OpenLong | Self::OpenShort)
    }

    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for Action {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "open_long" => Self::OpenLong,
            "open_short" => Self::OpenShort,
            "close_long" => Self::CloseLong,
            "close_short" => Self::CloseShort,
            "partial_close_long" => Self::PartialCloseLong,
            "partial_close_short" => Self::PartialCloseShort,
            "hold" => Self::Hold,
            "wait" => Self::Wait,
            "move_sl_to_breakeven" => Self::MoveSlToBreakeven,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One model-proposed action. Numeric fields default to zero when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub symbol: String,
    pub action: Action,
    #[serde(default)]
    pub leverage: u32,
    #[serde(default)]
    pub position_size_usd: f64,
    #[serde(default)]
    pub stop_loss: f64,
    #[serde(default)]
    pub take_profit: f64,
    #[serde(default)]
    pub new_stop_loss: f64,
    #[serde(default)]
    pub confidence: u32,
    #[serde(default)]
    pub risk_usd: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl Decision {
    /// A decision carrying only a symbol and action.
    #[must_use]
    pub fn new(symbol: impl Into<String>, action: Action) -> Self {
        Self {
            symbol: symbol.into(),
            action,
            leverage: 0,
            position_size_usd: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            new_stop_loss: 0.0,
            confidence: 0,
            risk_usd: 0.0,
            reasoning: String::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, leverage: u32, position_size_usd: f64) -> Self {
        self.leverage = leverage;
        self.position_size_usd = position_size_usd;
        self
    }

    #[must_use]
    pub fn with_exits(mut self, stop_loss: f64, take_profit: f64) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    #[must_use]
    pub fn with_new_stop_loss(mut self, new_stop_loss: f64) -> Self {
        self.new_stop_loss = new_stop_loss;
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}
