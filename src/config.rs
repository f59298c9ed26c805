//! Client configuration
//!
//! Values are layered, later sources winning: built-in defaults, an optional
//! JSON file, then `CATALOG_*` environment variables. The CLI applies its own
//! flags on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::downloader::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY};
use crate::fetcher::session::{HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS};

/// Default catalog service root
pub const DEFAULT_ROOT_URL: &str = "https://fusion-api.jpmorgan.com/fusion/v1/";
/// Catalog used when a call does not name one
pub const DEFAULT_CATALOG: &str = "common";
/// Download root used when none is configured
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Environment variable overriding [`ClientConfig::root_url`]
pub const ENV_ROOT_URL: &str = "CATALOG_ROOT_URL";
/// Environment variable overriding [`ClientConfig::default_catalog`]
pub const ENV_DEFAULT_CATALOG: &str = "CATALOG_DEFAULT_CATALOG";
/// Environment variable overriding [`ClientConfig::download_dir`]
pub const ENV_DOWNLOAD_DIR: &str = "CATALOG_DOWNLOAD_DIR";
/// Environment variable overriding [`ClientConfig::concurrency`]
pub const ENV_CONCURRENCY: &str = "CATALOG_CONCURRENCY";
/// Environment variable providing [`ClientConfig::bearer_token`]
pub const ENV_BEARER_TOKEN: &str = "CATALOG_BEARER_TOKEN";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {reason}")]
    Read {
        /// File path
        path: String,
        /// IO message
        reason: String,
    },

    /// Config file is not valid JSON for [`ClientConfig`]
    #[error("failed to parse config file {path}: {reason}")]
    Parse {
        /// File path
        path: String,
        /// Parser message
        reason: String,
    },

    /// A value is out of range or malformed
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Offending setting
        key: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Settings shared by the library facade and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Catalog service root URL
    pub root_url: String,
    /// Catalog used when a call passes none
    pub default_catalog: String,
    /// Root directory for downloaded files
    pub download_dir: PathBuf,
    /// Worker-pool size for batch downloads
    pub concurrency: usize,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Bearer token attached to every request
    pub bearer_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            root_url: DEFAULT_ROOT_URL.to_string(),
            default_catalog: DEFAULT_CATALOG.to_string(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout_secs: HTTP_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
            bearer_token: None,
        }
    }
}

impl ClientConfig {
    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading config file");
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Override fields from environment-style lookups
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_ROOT_URL) {
            self.root_url = url;
        }
        if let Some(catalog) = lookup(ENV_DEFAULT_CATALOG) {
            self.default_catalog = catalog;
        }
        if let Some(dir) = lookup(ENV_DOWNLOAD_DIR) {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_CONCURRENCY) {
            self.concurrency = value.trim().parse().map_err(|e| ConfigError::Invalid {
                key: ENV_CONCURRENCY.to_string(),
                reason: format!("{value:?}: {e}"),
            })?;
        }
        if let Some(token) = lookup(ENV_BEARER_TOKEN).filter(|t| !t.is_empty()) {
            self.bearer_token = Some(token);
        }
        Ok(self)
    }

    /// Reject settings no client can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "root_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.default_catalog.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "default_catalog".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::Invalid {
                key: "concurrency".to_string(),
                reason: format!("must be between 1 and {MAX_CONCURRENCY}"),
            });
        }
        Ok(())
    }
}
