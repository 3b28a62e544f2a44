//! Full cycle: context → prompts → mocked model → validated decisions → journal.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use algo_trade_core::{AccountState, Action, CandidateCoin, ReasoningConfig, ReasoningProvider, RiskConfig};
use algo_trade_decision::{
    build_system_prompt, build_user_prompt, DecisionAcquisition, DecisionContext, DecisionError,
    DecisionJournal, DecisionRecord, DecisionValidator, LlmClient,
};
use algo_trade_market::MarketSnapshot;
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNPARSABLE: &str = "I think BTC looks strong, going long with 3x.";
const VALID: &str = "Trend up on 4H.\n```json\n[{\"symbol\": \"BTCUSDT\", \"action\": \"open_long\", \"leverage\": 3, \"position_size_usd\": 2000, \"stop_loss\": 98000, \"take_profit\": 110000, \"confidence\": 80}]\n```";

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "content": text } }]
    }))
}

fn context() -> DecisionContext {
    let mut snapshots = BTreeMap::new();
    snapshots.insert(
        "BTCUSDT".to_string(),
        MarketSnapshot {
            symbol: "BTCUSDT".to_string(),
            current_price: 100_000.0,
            price_change_1h: 0.4,
            price_change_4h: 1.2,
            intraday: None,
            fifteen_minute: None,
            one_hour: None,
            four_hour: None,
            daily: None,
            open_interest: None,
            funding_rate: Some(0.0001),
        },
    );
    DecisionContext {
        current_time: Utc::now(),
        cycle_number: 1,
        runtime_minutes: 0,
        account: AccountState::with_equity(1000.0),
        positions: Vec::new(),
        candidates: vec![CandidateCoin::new("BTCUSDT")],
        snapshots,
        sharpe: None,
    }
}

async fn client_for(server: &MockServer) -> Arc<LlmClient> {
    let config = ReasoningConfig {
        provider: ReasoningProvider::DeepSeek,
        base_url: server.uri(),
        api_key: "sk-test".to_string(),
        ..ReasoningConfig::default()
    };
    Arc::new(
        LlmClient::from_config(&config)
            .unwrap()
            .with_retry_delay(Duration::from_millis(1)),
    )
}

#[tokio::test]
async fn test_unparsable_then_valid_is_accepted_with_one_correction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Your previous attempt failed"))
        .respond_with(reply(VALID))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply(UNPARSABLE))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context();
    let risk = RiskConfig::default();
    let system_prompt = build_system_prompt(&risk, Some("Prefer BTC."), false);
    let user_prompt = build_user_prompt(&ctx);

    let acquisition = DecisionAcquisition::new(client_for(&server).await, DecisionValidator::new(risk));
    let decision = acquisition
        .acquire(&system_prompt, &user_prompt, &ctx.validation_context())
        .await
        .unwrap();

    assert_eq!(decision.corrections(), 1);
    assert_eq!(decision.decisions.len(), 1);
    assert_eq!(decision.decisions[0].action, Action::OpenLong);
    assert_eq!(decision.user_prompt, user_prompt);
    assert!(decision.attempts[0].error.as_deref().unwrap().contains("no ```json"));

    let dir = TempDir::new().unwrap();
    let journal = DecisionJournal::open(dir.path()).unwrap();
    let mut record = DecisionRecord::new(ctx.cycle_number, ctx.account.clone(), Vec::new());
    record.prompt_template = Some("btc".to_string());
    record.apply_decision(&decision);
    journal.log(&record).unwrap();

    let saved = journal.records_for_template("Prefer BTC.").unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].attempts.len(), 2);
}

#[tokio::test]
async fn test_persistent_garbage_exhausts_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply(UNPARSABLE))
        .expect(2)
        .mount(&server)
        .await;

    let ctx = context();
    let acquisition = DecisionAcquisition::new(
        client_for(&server).await,
        DecisionValidator::new(RiskConfig::default()),
    );
    let err = acquisition
        .acquire("SYS", &build_user_prompt(&ctx), &ctx.validation_context())
        .await
        .unwrap_err();

    assert!(matches!(err, DecisionError::Exhausted { .. }));
    assert_eq!(err.last_response(), Some(UNPARSABLE));
    assert_eq!(err.attempts().len(), 2);
}
