use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single executed trade as recorded in the fill ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub trade_id: i64,
    pub order_id: i64,
    pub symbol: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub commission: Decimal,
    pub commission_asset: String,
    pub is_buyer: bool,
    pub is_maker: bool,
    pub timestamp: DateTime<Utc>,
}

/// One matched round trip between an opening lot and a closing fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub symbol: String,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub duration_secs: i64,
    pub matched_quantity: Decimal,
    pub avg_open_price: Decimal,
    pub avg_close_price: Decimal,
    pub total_fees: Decimal,
    pub net_profit: Decimal,
}

impl ClosedPosition {
    /// Holding time rendered as `1h2m3s`.
    #[must_use]
    pub fn duration_label(&self) -> String {
        let secs = self.duration_secs.max(0);
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if h > 0 {
            format!("{h}h{m}m{s}s")
        } else if m > 0 {
            format!("{m}m{s}s")
        } else {
            format!("{s}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn position(duration_secs: i64) -> ClosedPosition {
        let open = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        ClosedPosition {
            symbol: "BTCUSDT".to_string(),
            open_time: open,
            close_time: open + chrono::Duration::seconds(duration_secs),
            duration_secs,
            matched_quantity: dec!(1),
            avg_open_price: dec!(100),
            avg_close_price: dec!(101),
            total_fees: dec!(0),
            net_profit: dec!(1),
        }
    }

    #[test]
    fn test_duration_label() {
        assert_eq!(position(42).duration_label(), "42s");
        assert_eq!(position(125).duration_label(), "2m5s");
        assert_eq!(position(3_725).duration_label(), "1h2m5s");
    }
}
