//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `SHOPEASY_API_URL` - Base URL of the ShopEasy API (default: <http://localhost:3001>)
//! - `SHOPEASY_DATA_DIR` - Directory for local storage (default: `~/.shopeasy`)
//! - `SHOPEASY_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3001";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ShopEasy REST API.
    pub api_url: Url,
    /// Directory holding the local key-value store.
    pub data_dir: PathBuf,
    /// HTTP request timeout.
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable fails to parse. Unset
    /// variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_env_or_default("SHOPEASY_API_URL", DEFAULT_API_URL)
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPEASY_API_URL".to_owned(), e.to_string()))?;

        let data_dir = std::env::var("SHOPEASY_DATA_DIR").map_or_else(|_| default_data_dir(), PathBuf::from);

        let http_timeout = match std::env::var("SHOPEASY_HTTP_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar("SHOPEASY_HTTP_TIMEOUT_SECS".to_owned(), e.to_string())
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let sentry_dsn = std::env::var("SENTRY_DSN").ok();

        Ok(Self {
            api_url,
            data_dir,
            http_timeout,
            sentry_dsn,
        })
    }
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Per-user data directory, falling back to the working directory when no
/// home directory is known.
fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(|| PathBuf::from(".shopeasy"), |home| PathBuf::from(home).join(".shopeasy"))
}
