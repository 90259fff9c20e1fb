//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (marketplace password, Telegram token) are referenced by
//! env-var name in the config and resolved at runtime via `std::env::var`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{Credentials, PricingConfig, ProductScope};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_check_interval")]
    pub check_interval_minutes: u64,
    #[serde(default = "default_decrease_amount")]
    pub price_decrease_amount: Decimal,
    /// Floor price. Required; zero is accepted.
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub server_id: String,
    #[serde(default)]
    pub lot_id: String,
    #[serde(default)]
    pub whitelist: Vec<String>,
    /// Display-only currency suffix for logs and notifications.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Log the decision but never call the update endpoint.
    #[serde(default)]
    pub dry_run: bool,
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketplaceConfig {
    pub base_url: String,
    #[serde(default = "default_username_env")]
    pub username_env: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AlertsConfig {
    pub telegram_bot_token_env: Option<String>,
    pub telegram_chat_id_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Also append logs to this file.
    pub file: Option<String>,
}

/// One week.
const MAX_CHECK_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

fn default_check_interval() -> u64 {
    10
}

fn default_decrease_amount() -> Decimal {
    dec!(1)
}

fn default_currency() -> String {
    "₽".to_string()
}

fn default_username_env() -> String {
    "MARKET_USERNAME".to_string()
}

fn default_password_env() -> String {
    "MARKET_PASSWORD".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("game_id", &self.game_id),
            ("server_id", &self.server_id),
            ("lot_id", &self.lot_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(field));
            }
        }

        let min_price = self.min_price.ok_or(ConfigError::Missing("min_price"))?;
        if min_price < Decimal::ZERO {
            return Err(ConfigError::Invalid {
                field: "min_price",
                reason: format!("must be >= 0, got {min_price}"),
            });
        }

        if self.price_decrease_amount <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                field: "price_decrease_amount",
                reason: format!("must be > 0, got {}", self.price_decrease_amount),
            });
        }

        if self.check_interval_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "check_interval_minutes",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES {
            return Err(ConfigError::Invalid {
                field: "check_interval_minutes",
                reason: format!(
                    "must be at most {MAX_CHECK_INTERVAL_MINUTES}, got {}",
                    self.check_interval_minutes
                ),
            });
        }

        if self.marketplace.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("marketplace.base_url"));
        }

        Ok(())
    }

    /// Immutable pricing parameters for the decision engine.
    pub fn pricing(&self) -> PricingConfig {
        PricingConfig {
            self_listing_id: self.lot_id.clone(),
            min_price: self.min_price.unwrap_or(Decimal::ZERO),
            decrease_amount: self.price_decrease_amount,
            whitelist: self.whitelist.iter().cloned().collect::<HashSet<_>>(),
        }
    }

    pub fn scope(&self) -> ProductScope {
        ProductScope {
            game_id: self.game_id.clone(),
            server_id: self.server_id.clone(),
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }

    /// Resolve marketplace credentials from the configured env vars.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let username = Self::resolve_env(&self.marketplace.username_env)?;
        let password = Self::resolve_env(&self.marketplace.password_env)?;
        Ok(Credentials {
            username,
            password: SecretString::new(password),
        })
    }

    /// Telegram bot token and chat id, if both are configured and set.
    pub fn telegram(&self) -> Option<(SecretString, String)> {
        let token_env = self.alerts.telegram_bot_token_env.as_deref()?;
        let chat_env = self.alerts.telegram_chat_id_env.as_deref()?;
        let token = std::env::var(token_env).ok().filter(|t| !t.is_empty())?;
        let chat_id = std::env::var(chat_env).ok().filter(|c| !c.is_empty())?;
        Some((SecretString::new(token), chat_id))
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_name)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv(env_name.to_string()))
    }
}
