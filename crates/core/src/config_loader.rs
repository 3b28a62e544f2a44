use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from the default TOML file, `APP_` environment
    /// variables, and the optional JSON overlay.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration rooted at an explicit TOML path.
    ///
    /// Nested keys come from the environment with `__` as separator, e.g.
    /// `APP_REASONING__API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("APP_").split("__"))
            .join(Json::file(path.with_extension("json")))
            .extract()?;

        Ok(config)
    }

    /// Loads configuration with a profile-specific TOML layered on top.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(DEFAULT_CONFIG_PATH))
            .merge(Toml::file(format!("config/Config.{profile}.toml")))
            .merge(Env::prefixed("APP_").split("__"))
            .join(Json::file("config/Config.json"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReasoningProvider;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ConfigLoader::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.market.candle_limit, 100);
        assert_eq!(config.risk.altcoin_size_factor, 1.5);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
prompts_dir = "my_prompts"

[reasoning]
provider = "qwen"

[risk]
btc_eth_leverage = 20
altcoin_leverage = 8

[[traders]]
trader_id = "alpha"
candidates = ["SOLUSDT", "BNBUSDT"]
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(config.prompts_dir, "my_prompts");
        assert_eq!(config.reasoning.provider, ReasoningProvider::Qwen);
        assert_eq!(config.risk.btc_eth_leverage, 20);
        assert_eq!(config.risk.altcoin_leverage, 8);
        assert_eq!(config.risk.min_risk_reward, 3.0);
        assert_eq!(config.traders.len(), 1);
        assert_eq!(config.traders[0].candidates.len(), 2);
    }
}
