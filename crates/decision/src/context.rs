//! Prompt assembly for one decision cycle.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use algo_trade_core::{normalize_symbol, AccountState, CandidateCoin, PositionInfo, RiskConfig};
use algo_trade_market::{format_snapshot, MarketSnapshot};
use chrono::{DateTime, Utc};

use crate::validator::ValidationContext;

/// Everything the model sees in one cycle.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub current_time: DateTime<Utc>,
    pub cycle_number: u64,
    pub runtime_minutes: i64,
    pub account: AccountState,
    pub positions: Vec<PositionInfo>,
    pub candidates: Vec<CandidateCoin>,
    pub snapshots: BTreeMap<String, MarketSnapshot>,
    /// Sharpe ratio from past equity, when enough history exists.
    pub sharpe: Option<f64>,
}

impl DecisionContext {
    /// Live prices taken from the snapshots.
    #[must_use]
    pub fn prices(&self) -> HashMap<String, f64> {
        self.snapshots
            .iter()
            .map(|(symbol, snapshot)| (symbol.clone(), snapshot.current_price))
            .collect()
    }

    #[must_use]
    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            account_equity: self.account.total_equity,
            prices: self.prices(),
        }
    }
}

/// System prompt: base rules followed by the selected template.
///
/// With `override_base` and a non-empty template, the template is used alone.
#[must_use]
pub fn build_system_prompt(risk: &RiskConfig, template: Option<&str>, override_base: bool) -> String {
    let template = template.map(str::trim).filter(|t| !t.is_empty());
    if override_base {
        if let Some(custom) = template {
            return custom.to_string();
        }
    }

    let mut prompt = base_rules(risk);
    if let Some(custom) = template {
        prompt.push_str("\n\n# Strategy Notes\n\n");
        prompt.push_str(custom);
        prompt.push('\n');
    }
    prompt
}

fn base_rules(risk: &RiskConfig) -> String {
    let rr = risk.min_risk_reward;
    let alt_lev = risk.altcoin_leverage;
    let major_lev = risk.btc_eth_leverage;
    let alt_min = risk.altcoin_size_factor * 0.8;
    let alt_max = risk.altcoin_size_factor;
    let major_min = risk.btc_eth_size_factor * 0.5;
    let major_max = risk.btc_eth_size_factor;

    format!(
        r#"You are a professional cryptocurrency futures trader managing a live account.

# Objective

Maximize the Sharpe ratio: steady risk-adjusted returns matter more than raw profit.
Fewer, higher-quality trades beat frequent small ones.

# Hard Constraints

1. Risk/reward must be at least 1:{rr:.0} for every new position. Account for 0.08% round-trip fees.
2. Hold at most 3 positions at once.
3. Size by confidence. Altcoins: {alt_min:.1}x-{alt_max:.1}x equity notional at up to {alt_lev}x leverage. BTC/ETH: {major_min:.0}x-{major_max:.0}x equity notional at up to {major_lev}x leverage.
4. Keep total margin usage at or below 90%.
5. After closing a symbol, wait 3 cycles before re-entering it.

# Position Management

- Once a position is up 1.5R, use move_sl_to_breakeven to lock the entry.
- Positions tagged as external were opened outside this system. Evaluate them like any other position.
- Longs and shorts are equally valid. Follow the trend in either direction.
- Let winners run. Exiting after a few minutes turns into fee drag.

# Signals

Only open when several timeframes agree: trend (EMA structure, ADX), momentum (MACD, RSI),
volatility (ATR, Bollinger) and positioning (open interest, funding).
Confidence must be between 75 and 100 to open. Below 75, wait.

# Sharpe Feedback

- Sharpe < -0.5: stop trading, wait at least 6 cycles and re-examine the approach.
- -0.5 to 0: only trade confidence above 80, at most one trade per hour.
- 0 to 0.7: keep the current approach.
- Sharpe > 0.7: sizing may increase moderately.

# Output Format

First write your reasoning as a short structured analysis. Then output the decisions as a JSON
array in a ```json fenced block. Nothing may follow the JSON block.

```json
[
  {{"symbol": "BTCUSDT", "action": "open_short", "leverage": {major_lev}, "position_size_usd": 5000, "stop_loss": 97000, "take_profit": 91000, "confidence": 85, "risk_usd": 300, "reasoning": "bearish 4H structure with rising open interest"}},
  {{"symbol": "ETHUSDT", "action": "move_sl_to_breakeven", "new_stop_loss": 3520, "reasoning": "up 1.5R"}},
  {{"symbol": "SOLUSDT", "action": "close_long", "reasoning": "target reached"}}
]
```

Valid actions: open_long, open_short, close_long, close_short, partial_close_long, partial_close_short,
hold, wait, move_sl_to_breakeven.
Open actions require leverage, position_size_usd, stop_loss, take_profit and confidence.
"#
    )
}

/// User prompt describing the account and every analyzable symbol.
#[must_use]
pub fn build_user_prompt(ctx: &DecisionContext) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "**Time**: {} | **Cycle**: #{} | **Runtime**: {} min\n",
        ctx.current_time.format("%Y-%m-%d %H:%M:%S"),
        ctx.cycle_number,
        ctx.runtime_minutes
    );

    if let Some(btc) = ctx.snapshots.get("BTCUSDT") {
        let _ = write!(
            out,
            "**BTC**: {:.2} (1h: {:+.2}%, 4h: {:+.2}%)",
            btc.current_price, btc.price_change_1h, btc.price_change_4h
        );
        if let Some(intraday) = &btc.intraday {
            if let Some(macd) = intraday.macd {
                let _ = write!(out, " | MACD: {macd:.4}");
            }
            if let Some(rsi) = intraday.rsi7 {
                let _ = write!(out, " | RSI: {rsi:.2}");
            }
        }
        out.push_str("\n\n");
    }

    let account = &ctx.account;
    let _ = writeln!(
        out,
        "**Account**: equity {:.2} | available {:.2} ({:.1}%) | P&L {:+.2}% | margin {:.1}% | positions {}\n",
        account.total_equity,
        account.available_balance,
        account.available_pct(),
        account.total_pnl_pct,
        account.margin_used_pct,
        account.position_count
    );

    if ctx.positions.is_empty() {
        out.push_str("**Current Positions**: none\n\n");
    } else {
        out.push_str("## Current Positions\n");
        for (i, pos) in ctx.positions.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} {} | entry {:.4} mark {:.4} | P&L {:+.2}% | leverage {}x | margin {:.0} | liquidation {:.4}{}{}\n",
                i + 1,
                pos.symbol,
                pos.side.as_str(),
                pos.entry_price,
                pos.mark_price,
                pos.unrealized_pnl_pct,
                pos.leverage,
                pos.margin_used,
                pos.liquidation_price,
                holding_duration(pos, ctx.current_time),
                if pos.is_external { " (external position, evaluate)" } else { "" }
            );
            if let Some(snapshot) = ctx.snapshots.get(&normalize_symbol(&pos.symbol)) {
                out.push_str(&format_snapshot(snapshot));
                out.push('\n');
            }
        }
    }

    let _ = writeln!(out, "## Candidates ({})\n", ctx.snapshots.len());
    let mut shown = 0;
    for coin in &ctx.candidates {
        let Some(snapshot) = ctx.snapshots.get(&normalize_symbol(&coin.symbol)) else {
            continue;
        };
        shown += 1;
        let _ = writeln!(out, "### {shown}. {}{}\n", coin.symbol, source_tag(coin));
        out.push_str(&format_snapshot(snapshot));
        out.push('\n');
    }
    out.push('\n');

    if let Some(sharpe) = ctx.sharpe {
        let _ = writeln!(out, "## 📊 Sharpe Ratio: {sharpe:.2}\n");
    }

    out.push_str("---\n\n");
    out.push_str("Analyze now and output your decisions (reasoning + JSON).\n");
    out
}

/// Prompt for a correction round after a rejected response.
#[must_use]
pub fn correction_prompt(error: &str, user_prompt: &str, raw_response: &str) -> String {
    format!(
        "Your previous attempt failed with the following error: {error}\n\n\
         Original Request:\n{user_prompt}\n\n\
         Your Failed Response:\n{raw_response}\n\n\
         Please review your response, correct the error according to the system rules, \
         and provide the full, corrected response (CoT and JSON)."
    )
}

fn holding_duration(pos: &PositionInfo, now: DateTime<Utc>) -> String {
    if pos.update_time <= 0 {
        return String::new();
    }
    let minutes = (now.timestamp_millis() - pos.update_time).max(0) / 60_000;
    if minutes < 60 {
        format!(" | held {minutes} min")
    } else {
        format!(" | held {}h {}min", minutes / 60, minutes % 60)
    }
}

fn source_tag(coin: &CandidateCoin) -> &'static str {
    match coin.sources.as_slice() {
        [_, _, ..] => " (AI500+OI_Top)",
        [only] if only == "oi_top" => " (OI_Top)",
        _ => "",
    }
}
