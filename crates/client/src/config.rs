//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SMARTSALES_API_BASE_URL` - Backend REST API root (default: `http://127.0.0.1:8000/api`)
//! - `SMARTSALES_DATA_DIR` - Directory holding persisted session and cart (default: `.smartsales`)
//! - `SMARTSALES_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default backend API root.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Default directory for persisted client state.
pub const DEFAULT_DATA_DIR: &str = ".smartsales";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// SmartSales client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Directory for the durable storage file
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root, without a trailing slash (e.g. `http://127.0.0.1:8000/api`)
    pub base_url: Url,
    /// Per-request timeout. `None` waits for the backend indefinitely.
    pub timeout: Option<Duration>,
}

impl ApiConfig {
    /// Build an API configuration from a base URL string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is not
    /// an `http`/`https` URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: None,
        })
    }

    /// Absolute URL for an API path such as `sales/ventas/`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("SMARTSALES_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let timeout = lookup("SMARTSALES_HTTP_TIMEOUT_SECS")
            .map(|raw| parse_timeout("SMARTSALES_HTTP_TIMEOUT_SECS", &raw))
            .transpose()?;

        let data_dir = lookup("SMARTSALES_DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        Ok(Self {
            api: ApiConfig { base_url, timeout },
            data_dir,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Path of the durable storage file.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api", &self.api)
            .field("data_dir", &self.data_dir)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and normalize the API base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| {
        ConfigError::InvalidEnvVar("SMARTSALES_API_BASE_URL".to_string(), reason)
    };

    let url = Url::parse(raw.trim().trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL must have a host".to_string()));
    }
    Ok(url)
}

/// Parse a positive number of seconds.
fn parse_timeout(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api.endpoint("sales/ventas/"), "http://127.0.0.1:8000/api/sales/ventas/");
        assert_eq!(config.api.timeout, None);
        assert_eq!(config.data_dir, PathBuf::from(".smartsales"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ClientConfig::from_lookup(lookup_from(&[(
            "SMARTSALES_API_BASE_URL",
            "https://shop.example.com/api/",
        )]))
        .unwrap();
        assert_eq!(
            config.api.endpoint("/users/users/login/"),
            "https://shop.example.com/api/users/users/login/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ClientConfig::from_lookup(lookup_from(&[(
            "SMARTSALES_API_BASE_URL",
            "not a url",
        )]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));

        let result = ClientConfig::from_lookup(lookup_from(&[(
            "SMARTSALES_API_BASE_URL",
            "ftp://shop.example.com/api",
        )]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_timeout() {
        let config = ClientConfig::from_lookup(lookup_from(&[(
            "SMARTSALES_HTTP_TIMEOUT_SECS",
            "30",
        )]))
        .unwrap();
        assert_eq!(config.api.timeout, Some(Duration::from_secs(30)));

        let result = ClientConfig::from_lookup(lookup_from(&[(
            "SMARTSALES_HTTP_TIMEOUT_SECS",
            "0",
        )]));
        assert!(result.is_err());
    }

    #[test]
    fn test_storage_path() {
        let config = ClientConfig::from_lookup(lookup_from(&[(
            "SMARTSALES_DATA_DIR",
            "/tmp/smartsales",
        )]))
        .unwrap();
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/tmp/smartsales/storage.json")
        );
    }

    #[test]
    fn test_debug_redacts_sentry_dsn() {
        let config = ClientConfig::from_lookup(lookup_from(&[(
            "SENTRY_DSN",
            "https://publickey@o0.ingest.sentry.io/1",
        )]))
        .unwrap();
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("publickey"));
    }
}
