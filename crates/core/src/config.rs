//! Client configuration
//!
//! Layering, lowest precedence first: built-in defaults, an optional config
//! file (TOML or YAML), `FAWWERTY_*` environment variables using `__` as the
//! section separator (for example `FAWWERTY_API__BASE_URL`), and finally the
//! single `FAWWERTY_API_URL` variable for the backend base URL.

use crate::CoreResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the backend base URL
pub const API_URL_ENV: &str = "FAWWERTY_API_URL";

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3001/api";

/// Top-level client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
}

/// REST backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Per-request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: Option<String>,
}

/// External identity provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// OAuth client id registered with Google
    pub google_client_id: Option<String>,

    /// Scopes requested from the provider
    pub scope: String,

    /// How long to wait for the provider to signal readiness, in milliseconds
    pub ready_timeout_ms: u64,
}

/// Durable session storage configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the session file; the state data dir when unset
    pub dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 0,
            user_agent: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            google_client_id: None,
            scope: "openid email profile".to_string(),
            ready_timeout_ms: 15_000,
        }
    }
}

impl IdentityConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value fails to parse
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FAWWERTY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(url) = std::env::var(API_URL_ENV) {
            builder = builder.set_override("api.base_url", url)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load from `path` when it exists, otherwise defaults and environment only
    pub fn load_optional(path: &Path) -> CoreResult<Self> {
        if path.exists() {
            Self::load(Some(path))
        } else {
            Self::load(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_legacy_client() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.api.timeout(), None);
        assert_eq!(config.identity.scope, "openid email profile");
        assert_eq!(config.identity.ready_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://api.example.test/api"
timeout_secs = 20

[identity]
google_client_id = "client-123"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.api.timeout(), Some(Duration::from_secs(20)));
        assert_eq!(
            config.identity.google_client_id.as_deref(),
            Some("client-123")
        );
        // Untouched sections keep their defaults
        assert_eq!(config.identity.ready_timeout_ms, 15_000);
        assert_eq!(config.storage, StorageConfig::default());

        // FAWWERTY_API_URL may be set in the environment running the tests
        if std::env::var(API_URL_ENV).is_err() {
            assert_eq!(config.api.base_url, "https://api.example.test/api");
        }
    }

    #[test]
    fn test_missing_optional_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_optional(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.identity.scope, "openid email profile");
    }
}
