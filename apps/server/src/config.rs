//! Application configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use walletwatch_core::{Chain, WrappedTokens};
use walletwatch_provider::{PriceWindow, DEFAULT_BASE_URL};

pub const ENV_BIRDEYE_API_KEY: &str = "BIRDEYE_API_KEY";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_BIRDEYE_CHAIN: &str = "BIRDEYE_CHAIN";
pub const ENV_BIRDEYE_BASE_URL: &str = "BIRDEYE_BASE_URL";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_WRAPPED_TOKENS: &str = "WRAPPED_TOKENS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Market-data provider settings.
    pub provider: ProviderSettings,
    /// Alert evaluation and scheduling settings.
    pub alerts: AlertSettings,
    /// SQLite connection URL.
    pub database_url: String,
    /// Symbol to canonical address substitutions.
    pub wrapped_tokens: WrappedTokens,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            alerts: AlertSettings::default(),
            database_url: "sqlite:walletwatch.db".to_string(),
            wrapped_tokens: WrappedTokens::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub chain: Chain,
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub http_timeout_secs: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            chain: Chain::Solana,
            base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout_secs: 15,
            max_retries: 3,
        }
    }
}

/// Alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Seconds between background sweeps.
    pub interval_secs: u64,
    /// Upper bound for an on-demand check in seconds.
    pub alert_timeout_secs: u64,
    /// Price-change window compared against thresholds.
    pub window: PriceWindow,
    /// Top holders shown per card.
    pub holder_limit: u32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            alert_timeout_secs: 60,
            window: PriceWindow::M5,
            holder_limit: 10,
        }
    }
}

impl AppConfig {
    /// Overlay optional environment settings.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(chain) = non_empty(&lookup, ENV_BIRDEYE_CHAIN) {
            self.provider.chain = chain.parse().map_err(|e: walletwatch_core::UnknownChain| {
                ConfigError::Invalid {
                    var: ENV_BIRDEYE_CHAIN,
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(base_url) = non_empty(&lookup, ENV_BIRDEYE_BASE_URL) {
            self.provider.base_url = base_url;
        }
        if let Some(database_url) = non_empty(&lookup, ENV_DATABASE_URL) {
            self.database_url = database_url;
        }
        if let Some(wrapped) = lookup(ENV_WRAPPED_TOKENS) {
            self.wrapped_tokens = wrapped.parse().map_err(
                |e: walletwatch_core::WrappedTokensError| ConfigError::Invalid {
                    var: ENV_WRAPPED_TOKENS,
                    reason: e.to_string(),
                },
            )?;
        }
        Ok(())
    }
}

/// Secrets read from the environment. Never serialized.
#[derive(Clone)]
pub struct Credentials {
    pub birdeye_api_key: String,
    pub telegram_bot_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("birdeye_api_key", &"<redacted>")
            .field("telegram_bot_token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            birdeye_api_key: non_empty(&lookup, ENV_BIRDEYE_API_KEY)
                .ok_or(ConfigError::Missing(ENV_BIRDEYE_API_KEY))?,
            telegram_bot_token: non_empty(&lookup, ENV_TELEGRAM_BOT_TOKEN)
                .ok_or(ConfigError::Missing(ENV_TELEGRAM_BOT_TOKEN))?,
        })
    }
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.provider.chain, Chain::Solana);
        assert_eq!(config.provider.base_url, "https://public-api.birdeye.so");
        assert_eq!(config.alerts.interval_secs, 300);
        assert_eq!(config.alerts.window, PriceWindow::M5);
        assert_eq!(config.database_url, "sqlite:walletwatch.db");
        assert_eq!(config.wrapped_tokens.len(), 2);
    }

    #[test]
    fn test_apply_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                (ENV_BIRDEYE_CHAIN, "Base"),
                (ENV_DATABASE_URL, "sqlite::memory:"),
                (ENV_WRAPPED_TOKENS, "SOL=So111,BNB=0xbb4"),
                (ENV_BIRDEYE_BASE_URL, "  "),
            ]))
            .unwrap();
        assert_eq!(config.provider.chain, Chain::Base);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.wrapped_tokens.resolve(Some("bnb"), None), Some("0xbb4"));
        assert_eq!(config.wrapped_tokens.resolve(Some("ETH"), None), None);
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_apply_env_rejects_invalid() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[(ENV_BIRDEYE_CHAIN, "dogechain")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_BIRDEYE_CHAIN, .. }));

        let err = config
            .apply_env(env(&[(ENV_WRAPPED_TOKENS, "SOL")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_WRAPPED_TOKENS, .. }));
    }

    #[test]
    fn test_credentials_required() {
        let err = Credentials::from_env(env(&[(ENV_TELEGRAM_BOT_TOKEN, "123:abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_BIRDEYE_API_KEY)));

        let err = Credentials::from_env(env(&[(ENV_BIRDEYE_API_KEY, "key")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_TELEGRAM_BOT_TOKEN)));

        let creds = Credentials::from_env(env(&[
            (ENV_BIRDEYE_API_KEY, " be-secret "),
            (ENV_TELEGRAM_BOT_TOKEN, "123:abc"),
        ]))
        .unwrap();
        assert_eq!(creds.birdeye_api_key, "be-secret");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("123:abc"));
        assert!(!rendered.contains("be-secret"));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.alerts.window, config.alerts.window);
        assert_eq!(parsed.wrapped_tokens, config.wrapped_tokens);
    }
}
