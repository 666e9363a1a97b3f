//! # Application State
//!
//! [`AppState`] is built once at startup, wrapped in an `Arc` and handed to
//! every route through axum's `State` extractor. It holds no per-request
//! data; the filesystem behind the registry's storage is the only shared
//! mutable resource.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::registry::NpmRegistry;
use crate::storage::FsStorage;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<NpmRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire a filesystem-backed registry from configuration.
    pub fn from_config(config: Config) -> Self {
        let storage = Arc::new(FsStorage::new(config.storage.data_dir.clone()));
        let registry = NpmRegistry::new(
            storage,
            config.server.fallback_host.clone(),
            config.security.login_token.clone(),
        )
        .with_max_tarball_size(config.max_tarball_size_bytes());

        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}

/// Uniform body for operations that return no data.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SuccessResponse {
    pub message: String,
}
