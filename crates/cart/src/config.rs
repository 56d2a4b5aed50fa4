//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_KEY` - Storage key holding the cart record (default: cart)
//! - `CART_STORAGE_DIR` - Directory for file-backed storage (default: .cart)
//! - `CART_CURRENCY` - Currency for displayed totals (default: USD)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;

use storefront_cart_core::CurrencyCode;
use thiserror::Error;

use crate::storage::validate_key;

/// Default storage key for the cart record.
pub const DEFAULT_STORAGE_KEY: &str = "cart";

/// Default directory for file-backed storage.
pub const DEFAULT_STORAGE_DIR: &str = ".cart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Key the cart record is stored under
    pub storage_key: String,
    /// Directory used by file-backed storage
    pub storage_dir: PathBuf,
    /// Currency used to format totals
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            currency: CurrencyCode::default(),
            sentry_dsn: None,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_key = lookup("CART_STORAGE_KEY")
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        validate_key(&storage_key).map_err(|e| {
            ConfigError::InvalidEnvVar("CART_STORAGE_KEY".to_string(), e.to_string())
        })?;

        let storage_dir = lookup("CART_STORAGE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let currency = match lookup("CART_CURRENCY") {
            Some(value) => value.parse::<CurrencyCode>().map_err(|e| {
                ConfigError::InvalidEnvVar("CART_CURRENCY".to_string(), e.to_string())
            })?,
            None => CurrencyCode::default(),
        };

        let sentry_dsn = lookup("SENTRY_DSN").filter(|dsn| !dsn.trim().is_empty());

        Ok(Self {
            storage_key,
            storage_dir,
            currency,
            sentry_dsn,
        })
    }
}
