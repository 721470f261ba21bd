//! Configuration for the search-index layer.
//!
//! [`SearchIndexConfig`] is a plain serde struct so it can be populated from
//! any source (CLI flags, a settings file, or code). Every field has a default.
//!
//! # Example
//!
//! ```
//! use helios_search_index::SearchIndexConfig;
//!
//! let config = SearchIndexConfig {
//!     index_identifier: "media".to_string(),
//!     hostname: "search.internal".to_string(),
//!     ..Default::default()
//! };
//! assert_eq!(config.url(), "http://search.internal:9200");
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a [`SearchIndex`](crate::SearchIndex).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndexConfig {
    /// Namespace prefix of every sub-index (default: `"helios"`).
    /// Sub-indices are named `{index_identifier}_{type}`.
    #[serde(default = "default_index_identifier")]
    pub index_identifier: String,

    /// Human-facing label used in logs only (default: `"Elasticsearch"`).
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Scheme of the store (default: `"http"`).
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Hostname of the store (default: `"localhost"`).
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Port of the store (default: 9200).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional basic-auth username. Used only together with `password`.
    #[serde(default)]
    pub username: Option<String>,

    /// Optional basic-auth password. Used only together with `username`.
    #[serde(default)]
    pub password: Option<String>,

    /// Delay between reachability probes at startup, in milliseconds
    /// (default: 10000). Must be greater than 0.
    #[serde(default = "default_retry_delay_on_startup_ms")]
    pub retry_delay_on_startup_ms: i64,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Maximum `from + size` a single query may request (default: 10000).
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u64,

    /// Directories searched, in order, for schema overrides before the
    /// built-in defaults.
    #[serde(default)]
    pub schema_roots: Vec<PathBuf>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_index_identifier() -> String {
    "helios".to_string()
}

fn default_index_name() -> String {
    "Elasticsearch".to_string()
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9200
}

fn default_retry_delay_on_startup_ms() -> i64 {
    10000
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_max_result_window() -> u64 {
    10000
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            index_identifier: default_index_identifier(),
            index_name: default_index_name(),
            scheme: default_scheme(),
            hostname: default_hostname(),
            port: default_port(),
            username: None,
            password: None,
            retry_delay_on_startup_ms: default_retry_delay_on_startup_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_result_window: default_max_result_window(),
            schema_roots: Vec::new(),
            disable_certificate_validation: false,
        }
    }
}

impl SearchIndexConfig {
    /// Returns the URL of the store, e.g. `http://localhost:9200`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.hostname, self.port)
    }

    /// Returns the basic-auth credentials when both parts are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let password = self.password.as_deref().map(str::trim).filter(|s| !s.is_empty());
        username.zip(password)
    }

    /// Returns the startup probe delay.
    ///
    /// Call [`validate`](Self::validate) first; a non-positive delay maps to zero.
    pub fn retry_delay_on_startup(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.retry_delay_on_startup_ms).unwrap_or(0))
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validates the configuration.
    ///
    /// Runs before any store I/O so misconfiguration fails fast at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_delay_on_startup_ms <= 0 {
            return Err(ConfigError::InvalidRetryDelay {
                value: self.retry_delay_on_startup_ms,
            });
        }

        if self.index_identifier.trim().is_empty() {
            return Err(ConfigError::BlankIndexIdentifier);
        }

        if !matches!(self.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                scheme: self.scheme.clone(),
            });
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.max_result_window == 0 {
            return Err(ConfigError::InvalidResultWindow);
        }

        if let Some(missing) = self.schema_roots.iter().find(|root| !root.is_dir()) {
            return Err(ConfigError::MissingSchemaRoot {
                path: missing.display().to_string(),
            });
        }

        Ok(())
    }
}
