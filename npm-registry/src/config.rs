//! # Configuration Management
//!
//! Configuration is a JSON document with four sections, each of which may be
//! omitted entirely to take its defaults:
//!
//! ```json
//! {
//!   "server": { "host": "127.0.0.1", "port": 8080, "fallback_host": "localhost:8080" },
//!   "storage": { "data_dir": "registry_data" },
//!   "limits": { "max_request_body_size_mb": 150, "max_tarball_size_mb": 100 },
//!   "security": { "login_token": "..." }
//! }
//! ```
//!
//! ```rust,no_run
//! use npm_registry::Config;
//! let config = Config::load_or_default("registry.json")?;
//! # Ok::<(), npm_registry::AppError>(())
//! ```

use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Host used in tarball URLs when a request carries no usable `Host` header
    pub fallback_host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            fallback_host: "localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per package
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("registry_data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_request_body_size_mb: usize,
    pub max_tarball_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_body_size_mb: 150,
            max_tarball_size_mb: 100,
        }
    }
}

/// The registry has no real authentication. `login_token` is handed to every
/// client that logs in and is never checked on any request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub login_token: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            login_token: "npm-registry-anonymous-token".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config_str = fs::read_to_string(path)?;
        let config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    /// Load configuration from `path` if it exists, otherwise use the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn max_request_body_size_bytes(&self) -> usize {
        self.limits.max_request_body_size_mb * 1024 * 1024
    }

    pub fn max_tarball_size_bytes(&self) -> u64 {
        self.limits.max_tarball_size_mb * 1024 * 1024
    }
}
