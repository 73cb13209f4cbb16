//! Application Configuration Module
//!
//! Loads the coach service settings from environment variables (and a local
//! `.env` file, when one exists) into a single struct.

use secrecy::SecretString;
use std::env;
use thinksmarter_core::coach::{
    CoachConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, is_plausible_api_key,
};
use tracing::Level;

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub api_key: Option<SecretString>,
    pub chat_model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `ANTHROPIC_API_KEY`: Secret key for the Messages API. Required unless running offline.
    // *   `CHAT_MODEL`: (Optional) Model name. Defaults to "claude-3-7-sonnet-latest".
    // *   `ANTHROPIC_BASE_URL`: (Optional) API root. Defaults to "https://api.anthropic.com".
    // *   `MAX_TOKENS`: (Optional) Reply token limit. Defaults to 1000.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env(offline: bool) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(offline, |name| env::var(name).ok())
    }

    fn from_lookup(
        offline: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let chat_model = lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = lookup("ANTHROPIC_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let max_tokens = match lookup("MAX_TOKENS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|tokens| *tokens > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "MAX_TOKENS".to_string(),
                    value,
                })?,
            None => DEFAULT_MAX_TOKENS,
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidValue {
                name: "RUST_LOG".to_string(),
                value: log_level_str,
            })?;

        let api_key = match lookup("ANTHROPIC_API_KEY").map(|key| key.trim().to_string()) {
            Some(key) if !is_plausible_api_key(&key) => {
                return Err(ConfigError::InvalidValue {
                    name: "ANTHROPIC_API_KEY".to_string(),
                    value: "<redacted>".to_string(),
                });
            }
            Some(key) => Some(SecretString::from(key)),
            None if offline => None,
            None => {
                return Err(ConfigError::MissingVar(
                    "ANTHROPIC_API_KEY must be set unless --offline is used".to_string(),
                ));
            }
        };

        Ok(Self {
            api_key,
            chat_model,
            base_url,
            max_tokens,
            log_level,
        })
    }

    /// Client settings for the hosted model, or `None` when no key is set.
    pub fn coach_config(&self) -> Option<CoachConfig> {
        use secrecy::ExposeSecret;

        self.api_key.as_ref().map(|key| {
            CoachConfig::builder()
                .with_api_key(key.expose_secret())
                .with_model(&self.chat_model)
                .with_base_url(&self.base_url)
                .with_max_tokens(self.max_tokens)
                .build()
        })
    }
}
