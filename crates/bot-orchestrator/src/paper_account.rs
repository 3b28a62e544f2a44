//! Simulated account for traders without an exchange connection.
//!
//! Equity starts at the configured amount and only changes when the caller
//! says so; positions are whatever was last installed.

use algo_trade_core::{AccountSource, AccountState, PositionInfo};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

#[derive(Debug)]
pub struct PaperAccount {
    initial_equity: f64,
    inner: RwLock<PaperBook>,
}

#[derive(Debug)]
struct PaperBook {
    equity: f64,
    positions: Vec<PositionInfo>,
}

impl PaperAccount {
    #[must_use]
    pub fn new(initial_equity: f64) -> Self {
        Self {
            initial_equity,
            inner: RwLock::new(PaperBook {
                equity: initial_equity,
                positions: Vec::new(),
            }),
        }
    }

    pub fn set_equity(&self, equity: f64) {
        self.inner.write().equity = equity;
    }

    pub fn set_positions(&self, positions: Vec<PositionInfo>) {
        self.inner.write().positions = positions;
    }

    /// Current account figures derived from equity and held margin.
    #[must_use]
    pub fn snapshot(&self) -> AccountState {
        let book = self.inner.read();
        let margin_used: f64 = book.positions.iter().map(|p| p.margin_used).sum();
        let total_pnl = book.equity - self.initial_equity;
        let pct = |part: f64, whole: f64| if whole > 0.0 { part / whole * 100.0 } else { 0.0 };

        AccountState {
            total_equity: book.equity,
            available_balance: (book.equity - margin_used).max(0.0),
            total_pnl,
            total_pnl_pct: pct(total_pnl, self.initial_equity),
            margin_used,
            margin_used_pct: pct(margin_used, book.equity),
            position_count: book.positions.len(),
        }
    }
}

#[async_trait]
impl AccountSource for PaperAccount {
    async fn account_state(&self) -> Result<AccountState> {
        Ok(self.snapshot())
    }

    async fn open_positions(&self) -> Result<Vec<PositionInfo>> {
        Ok(self.inner.read().positions.clone())
    }
}
