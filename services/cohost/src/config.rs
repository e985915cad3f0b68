//! Service configuration, loaded from the environment.
//!
//! Everything has a default except the embedding key. Without one the
//! service falls back to local hashing embeddings, so it still runs offline.

use std::env;
use std::str::FromStr;

use cohost_core::config::TimingConfig;
use cohost_core::embedding::config::DEFAULT_EMBEDDING_MODEL;
use secrecy::SecretString;
use tracing::Level;

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub openai_api_key: Option<SecretString>,
    pub embedding_model: String,
    pub log_level: Level,
    pub timing: TimingConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error(transparent)]
    Timing(#[from] cohost_core::error::ConfigError),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `OPENAI_API_KEY`: (Optional) Key for the embeddings endpoint. Local hashing embeddings are used without it.
    // *   `EMBEDDING_MODEL`: (Optional) Defaults to "text-embedding-3-small".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    // *   `SILENCE_THRESHOLD_MS`, `TOPIC_SHIFT_THRESHOLD`, `MIN_INTERRUPTION_SCORE`,
    //     `CHECK_INTERVAL_MS`, `EMBEDDING_TIMEOUT_MS`: (Optional) Timing overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        let embedding_model =
            lookup("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        let defaults = TimingConfig::default();
        let timing = TimingConfig {
            silence_threshold_ms: parse_or(
                &lookup,
                "SILENCE_THRESHOLD_MS",
                defaults.silence_threshold_ms,
            )?,
            topic_shift_threshold: parse_or(
                &lookup,
                "TOPIC_SHIFT_THRESHOLD",
                defaults.topic_shift_threshold,
            )?,
            min_interruption_score: parse_or(
                &lookup,
                "MIN_INTERRUPTION_SCORE",
                defaults.min_interruption_score,
            )?,
            silence_check_interval_ms: parse_or(
                &lookup,
                "CHECK_INTERVAL_MS",
                defaults.silence_check_interval_ms,
            )?,
            embedding_timeout_ms: parse_or(
                &lookup,
                "EMBEDDING_TIMEOUT_MS",
                defaults.embedding_timeout_ms,
            )?,
            ..defaults
        };
        timing.validate()?;

        Ok(Self {
            openai_api_key,
            embedding_model,
            log_level,
            timing,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}
