//! End-to-end snapshot construction against a mocked futures API.

use std::sync::Arc;
use std::time::Duration;

use algo_trade_core::MarketConfig;
use algo_trade_market::{format_snapshot, BinanceFuturesClient, MarketSnapshotBuilder};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn klines(n: usize, step_ms: i64, base: f64) -> Value {
    let rows: Vec<Value> = (0..n)
        .map(|i| {
            let close = base + (i % 5) as f64 + i as f64 * 0.1;
            let t = i as i64 * step_ms;
            json!([
                t,
                format!("{:.2}", close - 0.5),
                format!("{:.2}", close + 1.0),
                format!("{:.2}", close - 1.0),
                format!("{:.2}", close),
                "1000.0",
                t + step_ms - 1
            ])
        })
        .collect();
    Value::Array(rows)
}

async fn mount_symbol(server: &MockServer, symbol: &str, open_interest: &str) {
    for (interval, step) in [
        ("3m", 180_000),
        ("15m", 900_000),
        ("1h", 3_600_000),
        ("4h", 14_400_000),
        ("1d", 86_400_000),
    ] {
        Mock::given(method("GET"))
            .and(path("/fapi/v1/klines"))
            .and(query_param("symbol", symbol))
            .and(query_param("interval", interval))
            .respond_with(ResponseTemplate::new(200).set_body_json(klines(100, step, 100.0)))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/fapi/v1/openInterest"))
        .and(query_param("symbol", symbol))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "openInterest": open_interest })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/premiumIndex"))
        .and(query_param("symbol", symbol))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "lastFundingRate": "0.0001" })))
        .mount(server)
        .await;
}

fn builder_for(server: &MockServer) -> MarketSnapshotBuilder {
    let client = BinanceFuturesClient::with_config(&server.uri(), 200, Duration::from_secs(5)).unwrap();
    MarketSnapshotBuilder::new(Arc::new(client), &MarketConfig::default())
}

#[tokio::test]
async fn test_liquid_and_illiquid_candidates() {
    let server = MockServer::start().await;
    // ~110 price: 1M contracts is liquid, 10 contracts is not
    mount_symbol(&server, "BTCUSDT", "1000000").await;
    mount_symbol(&server, "PEPEUSDT", "10").await;

    let builder = builder_for(&server);

    let universe = builder
        .build_universe(&[], &["BTCUSDT".to_string(), "PEPEUSDT".to_string()])
        .await
        .unwrap();
    assert_eq!(universe.snapshots.len(), 1);
    assert_eq!(universe.illiquid, vec!["PEPEUSDT".to_string()]);

    let btc = &universe.snapshots["BTCUSDT"];
    assert!(btc.missing_timeframes().is_empty());
    assert!(btc.four_hour.as_ref().unwrap().adx14.is_some());
    assert_eq!(btc.funding_rate, Some(0.0001));

    let text = format_snapshot(btc);
    assert!(text.contains("### BTCUSDT Market Data"));
    assert!(text.contains("4H_ADX_14"));
    assert!(text.contains("15M_MACD_signal_series (last 10)"));

    // Held positions bypass the filter.
    let held = builder
        .build_universe(&["PEPEUSDT".to_string()], &[])
        .await
        .unwrap();
    assert!(held.snapshots.contains_key("PEPEUSDT"));
}

#[tokio::test]
async fn test_unknown_symbol_universe_fails_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"code":-1121,"msg":"Invalid symbol."}"#))
        .mount(&server)
        .await;

    let result = builder_for(&server)
        .build_universe(&[], &["NOPEUSDT".to_string()])
        .await;
    assert!(result.is_err());
}
