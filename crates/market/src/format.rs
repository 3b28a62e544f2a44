//! Markdown rendering of a [`MarketSnapshot`] for prompt payloads.

use std::fmt::Write;

use crate::snapshot::MarketSnapshot;

/// Renders one symbol's market data block.
///
/// Timeframes that failed to load and indicators without enough history are
/// left out rather than printed as zero.
#[must_use]
pub fn format_snapshot(data: &MarketSnapshot) -> String {
    let mut sb = String::new();
    // Writing into a String cannot fail.
    let _ = write_snapshot(&mut sb, data);
    sb
}

fn write_snapshot(sb: &mut String, data: &MarketSnapshot) -> std::fmt::Result {
    writeln!(sb, "### {} Market Data\n", data.symbol)?;
    writeln!(sb, "**Current Price**: `{:.4}`", data.current_price)?;
    writeln!(
        sb,
        "**Price Change**: 1h: `{:.2}%` | 4h: `{:.2}%`",
        data.price_change_1h, data.price_change_4h
    )?;
    if let Some(rate) = data.funding_rate {
        writeln!(sb, "**Funding Rate**: `{:.4}%`", rate * 100.0)?;
    }
    if let Some(oi) = data.open_interest {
        writeln!(
            sb,
            "**Open Interest**: latest `{:.2}` | avg `{:.2}` | notional `{:.2}M USD`",
            oi.latest,
            oi.average,
            oi.notional(data.current_price) / 1_000_000.0
        )?;
    }

    if let Some(daily) = &data.daily {
        sb.push_str("\n**Daily (1D) Data:**\n");
        value_line(sb, "1D_EMA_50", daily.ema50, 4)?;
    }

    if let Some(h4) = &data.four_hour {
        sb.push_str("\n**4-Hour (4H) Data:**\n");
        value_line(sb, "4H_EMA_20", h4.ema20, 4)?;
        value_line(sb, "4H_EMA_50", h4.ema50, 4)?;
        value_line(sb, "4H_ADX_14", h4.adx14.map(|r| r.adx), 2)?;
        value_line(sb, "4H_ATR_14", h4.atr14, 4)?;
        value_line(sb, "4H_Next_Support", h4.levels.map(|l| l.support), 4)?;
        value_line(sb, "4H_Next_Resistance", h4.levels.map(|l| l.resistance), 4)?;
    }

    if let Some(h1) = &data.one_hour {
        sb.push_str("\n**1-Hour (1H) Data:**\n");
        value_line(sb, "1H_EMA_50", h1.ema50, 4)?;
        value_line(sb, "1H_ATR_14", h1.atr14, 4)?;
    }

    if let Some(m15) = &data.fifteen_minute {
        sb.push_str("\n**15-Minute (15M) Data (Trigger Timeframe):**\n");
        series_line(sb, "15M_RSI_14_series (last 10)", &m15.rsi14_values)?;
        series_line(sb, "15M_MACD_line_series (last 10)", &m15.macd_line_values)?;
        series_line(sb, "15M_MACD_signal_series (last 10)", &m15.macd_signal_values)?;
    }

    if let Some(m3) = &data.intraday {
        sb.push_str("\n**3-Minute (3M) Data (Execution Timeframe):**\n");
        value_line(sb, "3M_EMA_20", m3.ema20, 4)?;
        value_line(sb, "3M_MACD", m3.macd, 4)?;
        value_line(sb, "3M_RSI_7", m3.rsi7, 2)?;
        value_line(sb, "3M_ATR_14", m3.atr14, 4)?;
        value_line(sb, "3M_BB_Upper", m3.bollinger.map(|b| b.upper), 4)?;
        value_line(sb, "3M_BB_Lower", m3.bollinger.map(|b| b.lower), 4)?;
    }

    Ok(())
}

fn value_line(sb: &mut String, label: &str, value: Option<f64>, precision: usize) -> std::fmt::Result {
    match value {
        Some(v) => writeln!(sb, "- **{label}**: `{v:.precision$}`"),
        None => Ok(()),
    }
}

fn series_line(sb: &mut String, label: &str, values: &[f64]) -> std::fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    writeln!(sb, "- **{label}**: `{}`", format_series(values, 4))
}

/// `[a, b, c]` with fixed precision.
#[must_use]
pub fn format_series(values: &[f64], precision: usize) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.precision$}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{AdxReading, PriceLevels};
    use crate::snapshot::{DailySnapshot, FifteenMinuteSnapshot, FourHourSnapshot};
    use algo_trade_core::OpenInterest;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            symbol: "BTCUSDT".to_string(),
            current_price: 43_250.5,
            price_change_1h: 0.456,
            price_change_4h: -1.2,
            intraday: None,
            fifteen_minute: None,
            one_hour: None,
            four_hour: None,
            daily: None,
            open_interest: None,
            funding_rate: None,
        }
    }

    #[test]
    fn test_header_lines() {
        let text = format_snapshot(&snapshot());
        assert!(text.starts_with("### BTCUSDT Market Data\n\n"));
        assert!(text.contains("**Current Price**: `43250.5000`"));
        assert!(text.contains("**Price Change**: 1h: `0.46%` | 4h: `-1.20%`"));
        assert!(!text.contains("Daily"));
    }

    #[test]
    fn test_funding_and_open_interest() {
        let mut snap = snapshot();
        snap.funding_rate = Some(0.0001);
        snap.open_interest = Some(OpenInterest {
            latest: 1000.0,
            average: 999.0,
        });
        let text = format_snapshot(&snap);
        assert!(text.contains("**Funding Rate**: `0.0100%`"));
        assert!(text.contains("notional `43.25M USD`"));
    }

    #[test]
    fn test_timeframe_blocks() {
        let mut snap = snapshot();
        snap.daily = Some(DailySnapshot { ema50: Some(41_000.0) });
        snap.four_hour = Some(FourHourSnapshot {
            ema20: Some(42_000.0),
            ema50: None,
            adx14: Some(AdxReading {
                adx: 25.456,
                plus_di: 30.0,
                minus_di: 20.0,
            }),
            atr14: Some(500.0),
            levels: Some(PriceLevels {
                support: 41_500.0,
                resistance: 44_000.0,
            }),
        });
        snap.fifteen_minute = Some(FifteenMinuteSnapshot {
            rsi14_values: vec![55.0, 56.12346],
            macd_line_values: vec![],
            macd_signal_values: vec![],
        });

        let text = format_snapshot(&snap);
        assert!(text.contains("- **1D_EMA_50**: `41000.0000`"));
        assert!(text.contains("- **4H_ADX_14**: `25.46`"));
        assert!(!text.contains("4H_EMA_50"));
        assert!(text.contains("- **4H_Next_Resistance**: `44000.0000`"));
        assert!(text.contains("- **15M_RSI_14_series (last 10)**: `[55.0000, 56.1235]`"));
        assert!(!text.contains("MACD_line"));
    }

    #[test]
    fn test_format_series() {
        assert_eq!(format_series(&[], 2), "[]");
        assert_eq!(format_series(&[1.0, -2.5], 1), "[1.0, -2.5]");
    }
}
