//! Numeric risk rules applied to every model-proposed decision.

use std::collections::HashMap;

use algo_trade_core::{normalize_symbol, Action, Decision, RiskConfig};

use crate::error::ValidationError;

/// Symbols that get the larger leverage cap and size factor.
const MAJORS: [&str; 2] = ["BTCUSDT", "ETHUSDT"];

#[must_use]
pub fn is_major(symbol: &str) -> bool {
    MAJORS.contains(&normalize_symbol(symbol).as_str())
}

/// Account values the rules are measured against.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub account_equity: f64,
    /// Live price per normalized symbol.
    pub prices: HashMap<String, f64>,
}

impl ValidationContext {
    #[must_use]
    pub fn new(account_equity: f64) -> Self {
        Self {
            account_equity,
            prices: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_price(mut self, symbol: impl Into<String>, price: f64) -> Self {
        self.prices.insert(normalize_symbol(&symbol.into()), price);
        self
    }
}

#[derive(Debug, Clone)]
pub struct DecisionValidator {
    risk: RiskConfig,
}

impl DecisionValidator {
    #[must_use]
    pub fn new(risk: RiskConfig) -> Self {
        Self { risk }
    }

    #[must_use]
    pub fn risk(&self) -> &RiskConfig {
        &self.risk
    }

    #[must_use]
    pub fn max_leverage(&self, symbol: &str) -> u32 {
        if is_major(symbol) {
            self.risk.btc_eth_leverage
        } else {
            self.risk.altcoin_leverage
        }
    }

    /// Largest notional allowed before tolerance.
    #[must_use]
    pub fn max_position_value(&self, symbol: &str, equity: f64) -> f64 {
        let factor = if is_major(symbol) {
            self.risk.btc_eth_size_factor
        } else {
            self.risk.altcoin_size_factor
        };
        equity * factor
    }

    /// Checks decisions in order and stops at the first violation.
    ///
    /// # Errors
    /// Returns the 1-based index and reason of the first rejected decision.
    pub fn validate_all(&self, decisions: &[Decision], ctx: &ValidationContext) -> Result<(), ValidationError> {
        for (i, decision) in decisions.iter().enumerate() {
            if let Err(reason) = self.validate(decision, ctx) {
                tracing::debug!(
                    index = i + 1,
                    symbol = %decision.symbol,
                    action = %decision.action,
                    rule = %reason,
                    "Decision rejected"
                );
                return Err(ValidationError {
                    index: i + 1,
                    symbol: decision.symbol.clone(),
                    action: decision.action.to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Checks one decision.
    ///
    /// # Errors
    /// Returns a human-readable reason when a rule is violated.
    pub fn validate(&self, d: &Decision, ctx: &ValidationContext) -> Result<(), String> {
        match &d.action {
            Action::Unknown(raw) => Err(format!(
                "invalid action '{raw}', expected one of open_long, open_short, close_long, \
                 close_short, partial_close_long, partial_close_short, hold, wait, move_sl_to_breakeven"
            )),
            Action::OpenLong | Action::OpenShort => self.validate_open(d, ctx),
            Action::MoveSlToBreakeven => {
                if d.new_stop_loss > 0.0 {
                    Ok(())
                } else {
                    Err(format!("new_stop_loss must be greater than 0, got {}", d.new_stop_loss))
                }
            }
            Action::CloseLong
            | Action::CloseShort
            | Action::PartialCloseLong
            | Action::PartialCloseShort
            | Action::Hold
            | Action::Wait => Ok(()),
        }
    }

    fn validate_open(&self, d: &Decision, ctx: &ValidationContext) -> Result<(), String> {
        let is_long = d.action == Action::OpenLong;

        let max_leverage = self.max_leverage(&d.symbol);
        if d.leverage == 0 || d.leverage > max_leverage {
            return Err(format!(
                "leverage must be between 1 and {max_leverage} for {}, got {}",
                d.symbol, d.leverage
            ));
        }

        if d.position_size_usd < self.risk.min_notional_usd {
            return Err(format!(
                "position_size_usd must be at least {:.2} USD, got {:.2}",
                self.risk.min_notional_usd, d.position_size_usd
            ));
        }

        let max_value = self.max_position_value(&d.symbol, ctx.account_equity);
        if d.position_size_usd > max_value * (1.0 + self.risk.size_tolerance) {
            return Err(format!(
                "position value for {} cannot exceed {:.0} USD (equity {:.2}), got {:.0}",
                d.symbol, max_value, ctx.account_equity, d.position_size_usd
            ));
        }

        if d.stop_loss <= 0.0 || d.take_profit <= 0.0 {
            return Err("stop_loss and take_profit must both be greater than 0".to_string());
        }

        if is_long && d.stop_loss >= d.take_profit {
            return Err(format!(
                "long stop_loss ({}) must be below take_profit ({})",
                d.stop_loss, d.take_profit
            ));
        }
        if !is_long && d.stop_loss <= d.take_profit {
            return Err(format!(
                "short stop_loss ({}) must be above take_profit ({})",
                d.stop_loss, d.take_profit
            ));
        }

        let Some(&price) = ctx.prices.get(&normalize_symbol(&d.symbol)).filter(|p| **p > 0.0) else {
            return Err(format!("no live market price for {}", d.symbol));
        };

        let (risk_pct, reward_pct) = if is_long {
            if !(d.stop_loss < price && price < d.take_profit) {
                return Err(format!(
                    "long requires stop_loss < price < take_profit, got {} < {} < {}",
                    d.stop_loss, price, d.take_profit
                ));
            }
            ((price - d.stop_loss) / price * 100.0, (d.take_profit - price) / price * 100.0)
        } else {
            if !(d.take_profit < price && price < d.stop_loss) {
                return Err(format!(
                    "short requires take_profit < price < stop_loss, got {} < {} < {}",
                    d.take_profit, price, d.stop_loss
                ));
            }
            ((d.stop_loss - price) / price * 100.0, (price - d.take_profit) / price * 100.0)
        };

        let ratio = reward_pct / risk_pct;
        if ratio < self.risk.min_risk_reward {
            return Err(format!(
                "risk/reward too low ({ratio:.2}:1), must be >= {:.1}:1 [risk {risk_pct:.2}% reward {reward_pct:.2}%] \
                 [price {price} stop_loss {} take_profit {}]",
                self.risk.min_risk_reward, d.stop_loss, d.take_profit
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> DecisionValidator {
        DecisionValidator::new(RiskConfig::default())
    }

    fn ctx() -> ValidationContext {
        ValidationContext::new(1000.0)
            .with_price("BTCUSDT", 100.0)
            .with_price("SOLUSDT", 100.0)
    }

    fn long(symbol: &str, stop_loss: f64, take_profit: f64) -> Decision {
        Decision::new(symbol, Action::OpenLong)
            .with_entry(3, 500.0)
            .with_exits(stop_loss, take_profit)
    }

    // ============================================
    // Open Position Rules
    // ============================================

    #[test]
    fn test_short_symbol_uses_major_limits_and_live_price() {
        let d = Decision::new("btc", Action::OpenLong)
            .with_entry(5, 5000.0)
            .with_exits(95.0, 130.0);
        assert_eq!(validator().validate(&d, &ctx()), Ok(()));

        let alt = Decision::new("sol", Action::OpenLong)
            .with_entry(3, 1000.0)
            .with_exits(95.0, 130.0);
        assert_eq!(validator().validate(&alt, &ctx()), Ok(()));
        assert!(is_major("ethusdt"));
    }

    #[test]
    fn test_valid_long_and_short() {
        let v = validator();
        assert!(v.validate(&long("BTCUSDT", 98.0, 106.0), &ctx()).is_ok());

        let short = Decision::new("BTCUSDT", Action::OpenShort)
            .with_entry(5, 500.0)
            .with_exits(102.0, 94.0);
        assert!(v.validate(&short, &ctx()).is_ok());
    }

    #[test]
    fn test_long_with_stop_at_or_above_target_always_rejected() {
        let v = validator();
        for (sl, tp) in [(106.0, 106.0), (110.0, 106.0), (99.0, 98.0), (200.0, 1.0)] {
            let err = v.validate(&long("BTCUSDT", sl, tp), &ctx()).unwrap_err();
            assert!(err.contains("must be below take_profit"), "{sl}/{tp}: {err}");
        }
    }

    #[test]
    fn test_low_risk_reward_always_rejected() {
        let v = validator();
        // risk 2%, reward 2..5.9% => ratio < 3
        for tp in [102.0, 104.0, 105.9] {
            let err = v.validate(&long("BTCUSDT", 98.0, tp), &ctx()).unwrap_err();
            assert!(err.contains("risk/reward too low"), "{tp}: {err}");
        }
        // exactly 3:1 passes
        assert!(v.validate(&long("BTCUSDT", 98.0, 106.0), &ctx()).is_ok());
    }

    #[test]
    fn test_risk_reward_uses_live_price() {
        let v = validator();
        // At 100 the ratio is 3:1, at 101 it is 5/3.
        let decision = long("BTCUSDT", 98.0, 106.0);
        let moved = ValidationContext::new(1000.0).with_price("BTCUSDT", 101.0);
        assert!(v.validate(&decision, &ctx()).is_ok());
        assert!(v.validate(&decision, &moved).is_err());
    }

    #[test]
    fn test_price_must_sit_between_stop_and_target() {
        let v = validator();
        let err = v.validate(&long("BTCUSDT", 101.0, 120.0), &ctx()).unwrap_err();
        assert!(err.contains("stop_loss < price < take_profit"));
    }

    #[test]
    fn test_missing_price_rejected() {
        let err = validator()
            .validate(&long("DOGEUSDT", 0.1, 0.5), &ctx())
            .unwrap_err();
        assert!(err.contains("no live market price"));
    }

    #[test]
    fn test_leverage_caps() {
        let risk = RiskConfig {
            btc_eth_leverage: 10,
            altcoin_leverage: 3,
            ..RiskConfig::default()
        };
        let v = DecisionValidator::new(risk);

        let btc = long("BTCUSDT", 98.0, 110.0).with_entry(10, 500.0);
        assert!(v.validate(&btc, &ctx()).is_ok());

        let sol = long("SOLUSDT", 98.0, 110.0).with_entry(4, 500.0);
        assert!(v.validate(&sol, &ctx()).unwrap_err().contains("between 1 and 3"));

        let zero = long("BTCUSDT", 98.0, 110.0).with_entry(0, 500.0);
        assert!(v.validate(&zero, &ctx()).is_err());
    }

    #[test]
    fn test_position_value_caps() {
        let v = validator();
        // altcoin cap 1.5 x 1000 = 1500, with 1% tolerance 1515
        let ok = long("SOLUSDT", 98.0, 110.0).with_entry(3, 1515.0);
        assert!(v.validate(&ok, &ctx()).is_ok());
        let too_big = long("SOLUSDT", 98.0, 110.0).with_entry(3, 1516.0);
        assert!(v.validate(&too_big, &ctx()).unwrap_err().contains("cannot exceed 1500"));

        // BTC cap 10 x 1000
        let btc = long("BTCUSDT", 98.0, 110.0).with_entry(3, 10_000.0);
        assert!(v.validate(&btc, &ctx()).is_ok());

        let tiny = long("BTCUSDT", 98.0, 110.0).with_entry(3, 19.99);
        assert!(v.validate(&tiny, &ctx()).unwrap_err().contains("at least 20.00"));
    }

    #[test]
    fn test_zero_exits_rejected() {
        let err = validator()
            .validate(&long("BTCUSDT", 0.0, 110.0), &ctx())
            .unwrap_err();
        assert!(err.contains("must both be greater than 0"));
    }

    // ============================================
    // Other Actions
    // ============================================

    #[test]
    fn test_hold_never_rejected() {
        let v = validator();
        let empty = ValidationContext::default();
        for symbol in ["BTCUSDT", "UNLISTED", ""] {
            let mut d = Decision::new(symbol, Action::Hold)
                .with_entry(999, -5.0)
                .with_exits(-1.0, -2.0);
            d.new_stop_loss = -3.0;
            assert!(v.validate(&d, &empty).is_ok());
            assert!(v.validate(&d, &ctx()).is_ok());
        }
    }

    #[test]
    fn test_close_and_wait_need_no_numbers() {
        let v = validator();
        for action in [Action::CloseLong, Action::PartialCloseShort, Action::Wait] {
            assert!(v.validate(&Decision::new("SOLUSDT", action), &ctx()).is_ok());
        }
    }

    #[test]
    fn test_breakeven_requires_positive_stop() {
        let v = validator();
        let d = Decision::new("BTCUSDT", Action::MoveSlToBreakeven);
        assert!(v.validate(&d, &ctx()).unwrap_err().contains("new_stop_loss"));
        assert!(v.validate(&d.with_new_stop_loss(99.5), &ctx()).is_ok());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let d = Decision::new("BTCUSDT", Action::Unknown("sell_open".to_string()));
        assert!(validator()
            .validate(&d, &ctx())
            .unwrap_err()
            .contains("invalid action 'sell_open'"));
    }

    // ============================================
    // Batch Validation
    // ============================================

    #[test]
    fn test_first_violation_reports_one_based_index() {
        let decisions = vec![
            Decision::new("BTCUSDT", Action::Hold),
            long("BTCUSDT", 110.0, 106.0),
            Decision::new("ETHUSDT", Action::Unknown("buy".to_string())),
        ];
        let err = validator().validate_all(&decisions, &ctx()).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.action, "open_long");
        assert!(err.to_string().starts_with("decision #2"));
    }
}
