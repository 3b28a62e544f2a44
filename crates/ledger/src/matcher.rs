//! FIFO reconstruction of round-trip positions from raw fills.
//!
//! Fills are grouped by symbol and replayed in time order against two queues
//! of open lots. A buy first closes the oldest short lots and opens a long lot
//! with whatever is left; a sell does the mirror image. Every lot/fill pair
//! that meets produces one [`ClosedPosition`].

use std::collections::{BTreeMap, VecDeque};

use algo_trade_core::{ClosedPosition, Fill, PositionSide};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// The unmatched remainder of an opening fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenLot {
    pub symbol: String,
    pub side: PositionSide,
    pub trade_id: i64,
    pub open_time: DateTime<Utc>,
    pub price: Decimal,
    pub remaining_quantity: Decimal,
    /// Quantity of the fill that opened the lot; fees are prorated against it.
    pub original_quantity: Decimal,
    pub commission: Decimal,
}

impl OpenLot {
    fn from_fill(fill: &Fill, side: PositionSide, remaining: Decimal) -> Self {
        Self {
            symbol: fill.symbol.clone(),
            side,
            trade_id: fill.trade_id,
            open_time: fill.timestamp,
            price: fill.price,
            remaining_quantity: remaining,
            original_quantity: fill.quantity,
            commission: fill.commission,
        }
    }
}

/// Closed positions plus the lots still open afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    /// Newest close first.
    pub closed: Vec<ClosedPosition>,
    pub open_lots: Vec<OpenLot>,
}

impl MatchReport {
    #[must_use]
    pub fn total_net_profit(&self) -> Decimal {
        self.closed.iter().map(|p| p.net_profit).sum()
    }

    /// Quantity closed for `symbol`, counted once per round trip.
    #[must_use]
    pub fn matched_quantity(&self, symbol: &str) -> Decimal {
        self.closed
            .iter()
            .filter(|p| p.symbol == symbol)
            .map(|p| p.matched_quantity)
            .sum()
    }

    #[must_use]
    pub fn residual_quantity(&self, symbol: &str) -> Decimal {
        self.open_lots
            .iter()
            .filter(|l| l.symbol == symbol)
            .map(|l| l.remaining_quantity)
            .sum()
    }
}

/// Stateless FIFO matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionMatcher;

impl PositionMatcher {
    /// Closed positions, newest close first.
    #[must_use]
    pub fn match_positions(fills: &[Fill]) -> Vec<ClosedPosition> {
        Self::match_with_report(fills).closed
    }

    /// Closed positions and residual open lots.
    #[must_use]
    pub fn match_with_report(fills: &[Fill]) -> MatchReport {
        let mut by_symbol: BTreeMap<&str, Vec<&Fill>> = BTreeMap::new();
        for fill in fills {
            by_symbol.entry(fill.symbol.as_str()).or_default().push(fill);
        }

        let mut report = MatchReport::default();
        for (symbol, mut symbol_fills) in by_symbol {
            symbol_fills.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then(a.trade_id.cmp(&b.trade_id))
            });

            let mut book = LotBook::default();
            for fill in symbol_fills {
                book.apply(fill, &mut report.closed);
            }

            debug!(
                symbol,
                open_longs = book.longs.len(),
                open_shorts = book.shorts.len(),
                "Matched fills"
            );
            report.open_lots.extend(book.longs);
            report.open_lots.extend(book.shorts);
        }

        // Stable: ties keep per-symbol replay order.
        report.closed.sort_by(|a, b| b.close_time.cmp(&a.close_time));
        report
    }
}

#[derive(Default)]
struct LotBook {
    longs: VecDeque<OpenLot>,
    shorts: VecDeque<OpenLot>,
}

impl LotBook {
    fn apply(&mut self, fill: &Fill, closed: &mut Vec<ClosedPosition>) {
        if fill.quantity <= Decimal::ZERO {
            return;
        }

        let (opposing, same, opens_side) = if fill.is_buyer {
            (&mut self.shorts, &mut self.longs, PositionSide::Long)
        } else {
            (&mut self.longs, &mut self.shorts, PositionSide::Short)
        };

        let mut remaining = fill.quantity;
        while remaining > Decimal::ZERO {
            let Some(lot) = opposing.front_mut() else {
                break;
            };

            let matched = remaining.min(lot.remaining_quantity);
            closed.push(close(lot, fill, matched));

            remaining -= matched;
            lot.remaining_quantity -= matched;
            if lot.remaining_quantity <= Decimal::ZERO {
                opposing.pop_front();
            }
        }

        if remaining > Decimal::ZERO {
            same.push_back(OpenLot::from_fill(fill, opens_side, remaining));
        }
    }
}

fn close(lot: &OpenLot, fill: &Fill, matched: Decimal) -> ClosedPosition {
    let open_fee = prorate(lot.commission, matched, lot.original_quantity);
    let close_fee = prorate(fill.commission, matched, fill.quantity);
    let total_fees = open_fee + close_fee;

    let gross = match lot.side {
        PositionSide::Long => (fill.price - lot.price) * matched,
        PositionSide::Short => (lot.price - fill.price) * matched,
    };

    ClosedPosition {
        symbol: fill.symbol.clone(),
        open_time: lot.open_time,
        close_time: fill.timestamp,
        duration_secs: (fill.timestamp - lot.open_time).num_seconds(),
        matched_quantity: matched,
        avg_open_price: lot.price,
        avg_close_price: fill.price,
        total_fees,
        net_profit: gross - total_fees,
    }
}

fn prorate(fee: Decimal, matched: Decimal, original: Decimal) -> Decimal {
    if original > Decimal::ZERO {
        fee * matched / original
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn fill(trade_id: i64, symbol: &str, is_buyer: bool, qty: Decimal, price: Decimal, fee: Decimal, minute: u32) -> Fill {
        Fill {
            trade_id,
            order_id: trade_id * 10,
            symbol: symbol.to_string(),
            price,
            quantity: qty,
            commission: fee,
            commission_asset: "USDT".to_string(),
            is_buyer,
            is_maker: false,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap(),
        }
    }

    // ============================================
    // Long Round Trips
    // ============================================

    #[test]
    fn test_partial_closes_prorate_fees() {
        let fills = vec![
            fill(1, "BTCUSDT", true, dec!(1.0), dec!(100), dec!(0.1), 0),
            fill(2, "BTCUSDT", false, dec!(0.4), dec!(110), dec!(0.05), 1),
            fill(3, "BTCUSDT", false, dec!(0.6), dec!(90), dec!(0.05), 2),
        ];
        let report = PositionMatcher::match_with_report(&fills);

        assert_eq!(report.closed.len(), 2);
        // newest first
        assert_eq!(report.closed[0].net_profit, dec!(-6.11));
        assert_eq!(report.closed[0].total_fees, dec!(0.11));
        assert_eq!(report.closed[1].net_profit, dec!(3.91));
        assert_eq!(report.closed[1].duration_secs, 60);
        assert!(report.open_lots.is_empty());
    }

    #[test]
    fn test_one_close_spans_several_lots() {
        let fills = vec![
            fill(1, "ETHUSDT", true, dec!(1), dec!(100), dec!(0), 0),
            fill(2, "ETHUSDT", true, dec!(1), dec!(120), dec!(0), 1),
            fill(3, "ETHUSDT", false, dec!(1.5), dec!(130), dec!(0), 2),
        ];
        let report = PositionMatcher::match_with_report(&fills);

        let mut profits: Vec<Decimal> = report.closed.iter().map(|p| p.net_profit).collect();
        profits.sort();
        assert_eq!(profits, vec![dec!(5), dec!(30)]);
        assert_eq!(report.residual_quantity("ETHUSDT"), dec!(0.5));
        assert_eq!(report.open_lots[0].price, dec!(120));
    }

    // ============================================
    // Shorts and Flips
    // ============================================

    #[test]
    fn test_short_round_trip() {
        let fills = vec![
            fill(1, "SOLUSDT", false, dec!(2), dec!(150), dec!(0.2), 0),
            fill(2, "SOLUSDT", true, dec!(2), dec!(140), dec!(0.2), 5),
        ];
        let closed = PositionMatcher::match_positions(&fills);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].net_profit, dec!(19.6));
    }

    #[test]
    fn test_oversized_close_flips_side() {
        let fills = vec![
            fill(1, "BTCUSDT", true, dec!(1), dec!(100), dec!(0), 0),
            fill(2, "BTCUSDT", false, dec!(3), dec!(110), dec!(0), 1),
        ];
        let report = PositionMatcher::match_with_report(&fills);
        assert_eq!(report.closed.len(), 1);
        assert_eq!(report.open_lots.len(), 1);
        assert_eq!(report.open_lots[0].side, PositionSide::Short);
        assert_eq!(report.open_lots[0].remaining_quantity, dec!(2));
        assert_eq!(report.open_lots[0].original_quantity, dec!(3));
    }

    // ============================================
    // Ordering
    // ============================================

    #[test]
    fn test_symbols_are_isolated_and_sorted_by_close() {
        let fills = vec![
            fill(1, "BTCUSDT", true, dec!(1), dec!(100), dec!(0), 0),
            fill(2, "ETHUSDT", true, dec!(1), dec!(10), dec!(0), 1),
            fill(3, "ETHUSDT", false, dec!(1), dec!(11), dec!(0), 2),
            fill(4, "BTCUSDT", false, dec!(1), dec!(105), dec!(0), 3),
        ];
        let closed = PositionMatcher::match_positions(&fills);
        assert_eq!(closed[0].symbol, "BTCUSDT");
        assert_eq!(closed[1].symbol, "ETHUSDT");
    }

    #[test]
    fn test_timestamp_ties_break_on_trade_id() {
        // Same minute: the buy (id 1) must open before the sell (id 2) closes it.
        let fills = vec![
            fill(2, "BTCUSDT", false, dec!(1), dec!(105), dec!(0), 0),
            fill(1, "BTCUSDT", true, dec!(1), dec!(100), dec!(0), 0),
        ];
        let closed = PositionMatcher::match_positions(&fills);
        assert_eq!(closed[0].net_profit, dec!(5));
    }

    #[test]
    fn test_empty_and_zero_quantity() {
        assert!(PositionMatcher::match_positions(&[]).is_empty());
        let fills = vec![fill(1, "BTCUSDT", true, dec!(0), dec!(100), dec!(0), 0)];
        let report = PositionMatcher::match_with_report(&fills);
        assert!(report.closed.is_empty());
        assert!(report.open_lots.is_empty());
    }
}
