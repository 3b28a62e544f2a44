use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub reasoning: ReasoningConfig,
    pub risk: RiskConfig,
    pub traders: Vec<TraderConfig>,
    /// Directory of `*.txt` prompt templates.
    pub prompts_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            market: MarketConfig::default(),
            reasoning: ReasoningConfig::default(),
            risk: RiskConfig::default(),
            traders: Vec::new(),
            prompts_dir: "prompts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub api_url: String,
    pub rate_limit_per_second: u32,
    pub candle_limit: usize,
    /// Open-interest notional below which non-held candidates are skipped.
    pub liquidity_floor_usd: f64,
    pub request_timeout_secs: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            api_url: "https://fapi.binance.com".to_string(),
            rate_limit_per_second: 20,
            candle_limit: 100,
            liquidity_floor_usd: 15_000_000.0,
            request_timeout_secs: 30,
        }
    }
}

/// Supported text-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningProvider {
    #[default]
    DeepSeek,
    Qwen,
    Custom,
    Gemini,
}

impl ReasoningProvider {
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::Qwen => "https://dashscope.aliyuncs.com/compatible-mode/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::Custom => "",
        }
    }

    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::DeepSeek => "deepseek-chat",
            Self::Qwen => "qwen-max",
            Self::Gemini => "gemini-1.5-pro",
            Self::Custom => "",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub provider: ReasoningProvider,
    /// Empty means the provider default. A trailing `#` on a custom URL means
    /// the URL is used verbatim.
    pub base_url: String,
    pub model: String,
    /// Never written back out; supply via `APP_REASONING__API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: String,
    pub timeout_secs: u64,
    pub max_network_attempts: u32,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            provider: ReasoningProvider::DeepSeek,
            base_url: String::new(),
            model: String::new(),
            api_key: String::new(),
            timeout_secs: 120,
            max_network_attempts: 3,
            temperature: 0.5,
            max_tokens: 2000,
        }
    }
}

/// Hard numeric limits applied to every model-proposed decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub btc_eth_leverage: u32,
    pub altcoin_leverage: u32,
    /// Max notional as a multiple of account equity.
    pub btc_eth_size_factor: f64,
    pub altcoin_size_factor: f64,
    pub min_notional_usd: f64,
    pub min_risk_reward: f64,
    /// Relative slack on the notional cap.
    pub size_tolerance: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            btc_eth_leverage: 5,
            altcoin_leverage: 5,
            btc_eth_size_factor: 10.0,
            altcoin_size_factor: 1.5,
            min_notional_usd: 20.0,
            min_risk_reward: 3.0,
            size_tolerance: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderConfig {
    pub trader_id: String,
    pub enabled: bool,
    pub scan_interval_secs: u64,
    /// Template id from the prompt repository appended to the base rules.
    pub prompt_template: Option<String>,
    pub override_base_prompt: bool,
    /// Starting equity for the paper account.
    pub initial_equity: f64,
    pub candidates: Vec<String>,
    pub journal_dir: String,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            trader_id: "default".to_string(),
            enabled: true,
            scan_interval_secs: 180,
            prompt_template: None,
            override_base_prompt: false,
            initial_equity: 1000.0,
            candidates: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            journal_dir: "decision_logs".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_risk_limits() {
        let risk = RiskConfig::default();
        assert_eq!(risk.btc_eth_size_factor, 10.0);
        assert_eq!(risk.altcoin_size_factor, 1.5);
        assert_eq!(risk.min_risk_reward, 3.0);
        assert_eq!(risk.min_notional_usd, 20.0);
    }

    #[test]
    fn test_provider_defaults() {
        assert_eq!(
            ReasoningProvider::DeepSeek.default_base_url(),
            "https://api.deepseek.com/v1"
        );
        assert_eq!(ReasoningProvider::Qwen.default_model(), "qwen-max");
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = AppConfig::default();
        config.reasoning.api_key = "sk-secret".to_string();

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_partial_trader_config_uses_defaults() {
        let trader: TraderConfig =
            serde_json::from_str(r#"{"trader_id": "alpha", "candidates": ["SOLUSDT"]}"#).unwrap();
        assert_eq!(trader.trader_id, "alpha");
        assert_eq!(trader.scan_interval_secs, 180);
        assert_eq!(trader.candidates, vec!["SOLUSDT".to_string()]);
    }
}
