//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional with defaults:
//!
//! - `BASKET_STORAGE_DIR` - Directory for the file backend
//!   (default: `basket-data`)
//! - `BASKET_FLUSH_RETRIES` - Write attempts before a persistence failure
//!   is surfaced (default: 3, minimum: 1)
//! - `BASKET_FLUSH_RETRY_DELAY_MS` - Delay between attempts in milliseconds
//!   (default: 250)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default directory for the file backend.
pub const DEFAULT_STORAGE_DIR: &str = "basket-data";

const DEFAULT_FLUSH_RETRIES: u32 = 3;
const DEFAULT_FLUSH_RETRY_DELAY_MS: u64 = 250;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory the file backend stores values under.
    pub storage_dir: PathBuf,
    /// Write attempts before a persistence failure is surfaced.
    pub flush_retries: u32,
    /// Delay between write attempts.
    pub flush_retry_delay: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            flush_retries: DEFAULT_FLUSH_RETRIES,
            flush_retry_delay: Duration::from_millis(DEFAULT_FLUSH_RETRY_DELAY_MS),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage_dir = std::env::var("BASKET_STORAGE_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let flush_retries = match std::env::var("BASKET_FLUSH_RETRIES") {
            Ok(raw) => parse_value("BASKET_FLUSH_RETRIES", &raw)?,
            Err(_) => DEFAULT_FLUSH_RETRIES,
        };
        if flush_retries == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BASKET_FLUSH_RETRIES".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let retry_delay_ms = match std::env::var("BASKET_FLUSH_RETRY_DELAY_MS") {
            Ok(raw) => parse_value("BASKET_FLUSH_RETRY_DELAY_MS", &raw)?,
            Err(_) => DEFAULT_FLUSH_RETRY_DELAY_MS,
        };

        Ok(Self {
            storage_dir,
            flush_retries,
            flush_retry_delay: Duration::from_millis(retry_delay_ms),
        })
    }
}

/// Parse an environment variable value, naming the variable on failure.
fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|err: T::Err| ConfigError::InvalidEnvVar(key.to_string(), err.to_string()))
}
