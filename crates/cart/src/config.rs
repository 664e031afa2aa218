//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ROCKETSHOES_API_URL` - Base URL of the catalog API (default: `http://localhost:3333`)
//! - `ROCKETSHOES_DATA_DIR` - Directory for the durable cart snapshot
//!   (default: `{os data dir}/rocketshoes`)

use std::path::PathBuf;

use thiserror::Error;

/// Default catalog endpoint (the json-server the storefront ships with).
const DEFAULT_API_URL: &str = "http://localhost:3333";

/// File name of the string-keyed snapshot store inside the data directory.
const STORAGE_FILE_NAME: &str = "local-storage.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Could not resolve a data directory; set ROCKETSHOES_DATA_DIR")]
    NoDataDir,
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Base URL of the catalog API (no trailing slash).
    pub api_url: String,
    /// Directory holding the durable snapshot store.
    pub data_dir: PathBuf,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `ROCKETSHOES_API_URL` is not a valid URL or
    /// no data directory can be resolved.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_env_or_default("ROCKETSHOES_API_URL", DEFAULT_API_URL);
        let api_url = validate_api_url(&api_url)?;

        let data_dir = match get_optional_env("ROCKETSHOES_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir().ok_or(ConfigError::NoDataDir)?,
        };

        Ok(Self { api_url, data_dir })
    }

    /// Path of the snapshot store file inside the data directory.
    #[must_use]
    pub fn storage_file(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE_NAME)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate the catalog base URL and normalize away any trailing slash.
fn validate_api_url(raw: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("ROCKETSHOES_API_URL".to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "ROCKETSHOES_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Resolve the default snapshot directory: `{os data dir}/rocketshoes`.
fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut home| {
                home.push(".local");
                home.push("share");
                home
            })
        })
        .map(|base| base.join("rocketshoes"))
}
