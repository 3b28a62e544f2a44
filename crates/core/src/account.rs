use serde::{Deserialize, Serialize};

/// Account balances as reported by the execution collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub total_equity: f64,
    pub available_balance: f64,
    pub total_pnl: f64,
    pub total_pnl_pct: f64,
    pub margin_used: f64,
    pub margin_used_pct: f64,
    pub position_count: usize,
}

impl AccountState {
    /// Fresh account holding only cash.
    #[must_use]
    pub fn with_equity(equity: f64) -> Self {
        Self {
            total_equity: equity,
            available_balance: equity,
            ..Self::default()
        }
    }

    /// Available balance as a percentage of equity, zero when equity is not positive.
    #[must_use]
    pub fn available_pct(&self) -> f64 {
        if self.total_equity > 0.0 {
            self.available_balance / self.total_equity * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: f64,
    pub mark_price: f64,
    pub quantity: f64,
    pub leverage: u32,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_pct: f64,
    pub liquidation_price: f64,
    pub margin_used: f64,
    /// Epoch millis of the last position update, 0 when unknown.
    pub update_time: i64,
    /// Opened outside this system, e.g. before it started.
    #[serde(skip)]
    pub is_external: bool,
}

/// A symbol proposed for analysis along with where the suggestion came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCoin {
    pub symbol: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl CandidateCoin {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }
}
