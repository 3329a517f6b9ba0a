//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GIFTSOUQ_API_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `GIFTSOUQ_API_TIMEOUT_SECS` - Per-request timeout (default: 30)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnv(String),

    /// A variable is present but its value is invalid.
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// Configuration for the backend API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API, normalized without a trailing slash.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `GIFTSOUQ_API_URL` is missing or invalid, or
    /// if `GIFTSOUQ_API_TIMEOUT_SECS` is set but not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_required_env("GIFTSOUQ_API_URL")?;

        let timeout_secs = match std::env::var("GIFTSOUQ_API_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::Invalid("GIFTSOUQ_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Self::new(&api_url, Duration::from_secs(timeout_secs))
    }

    /// Build a configuration from an explicit URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not a valid http(s) URL.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let parsed = Url::parse(api_url)
            .map_err(|e| ConfigError::Invalid("GIFTSOUQ_API_URL".to_string(), e.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "GIFTSOUQ_API_URL".to_string(),
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnv(key.to_string()))
}
