//! # npm Registry Service
//!
//! [`NpmRegistry`] implements the protocol semantics independently of HTTP:
//! it is constructed once with an explicit [`PackageStorage`] and the
//! registry settings, and the axum handlers in [`crate::npm`] are thin
//! adapters over it.
//!
//! ## Tarball URLs
//!
//! Stored metadata never decides where tarballs live. On every metadata read
//! each version's `dist.tarball` is overwritten with
//! `http://<host>/<package>/-/<package>-<version>.tgz`, where `<host>` is the
//! request's `Host` header or the configured fallback. The same document
//! therefore serves correct URLs whichever address a client used.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use npm_registry::{registry::NpmRegistry, storage::FsStorage};
//! # async fn example() -> npm_registry::AppResult<()> {
//! let registry = NpmRegistry::new(
//!     Arc::new(FsStorage::new("registry_data")),
//!     "localhost:8080".to_string(),
//!     "token".to_string(),
//! );
//! let metadata = registry.package_metadata("left-pad", Some("npm.internal:8080")).await?;
//! println!("{}", metadata["dist-tags"]["latest"]);
//! # Ok(())
//! # }
//! ```

mod publish;
mod search;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::locks::PackageLocks;
use crate::storage::{tarball_filename, PackageStorage};
use crate::types::{LoginRequest, LoginResponse};
use crate::validation;

const DEFAULT_MAX_TARBALL_SIZE: u64 = 100 * 1024 * 1024;

/// Absolute tarball URL for `filename` of `package` as reached through `host`.
pub fn tarball_url(host: &str, package: &str, filename: &str) -> String {
    format!("http://{host}/{package}/-/{filename}")
}

/// Get `map[key]` as an object, replacing a missing or non-object value.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = map
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(object) => object,
        _ => unreachable!("entry was just replaced with an object"),
    }
}

pub struct NpmRegistry {
    storage: Arc<dyn PackageStorage>,
    locks: PackageLocks,
    fallback_host: String,
    login_token: String,
    max_tarball_size: u64,
}

impl NpmRegistry {
    pub fn new(storage: Arc<dyn PackageStorage>, fallback_host: String, login_token: String) -> Self {
        Self {
            storage,
            locks: PackageLocks::new(),
            fallback_host,
            login_token,
            max_tarball_size: DEFAULT_MAX_TARBALL_SIZE,
        }
    }

    pub fn with_max_tarball_size(mut self, bytes: u64) -> Self {
        self.max_tarball_size = bytes;
        self
    }

    pub fn storage(&self) -> &Arc<dyn PackageStorage> {
        &self.storage
    }

    /// Host to embed in tarball URLs: the request's `Host` header when it is
    /// well-formed, the configured fallback otherwise.
    pub fn resolve_host(&self, host: Option<&str>) -> String {
        match host {
            Some(host) => match validation::validate_host_header(host) {
                Ok(host) => host,
                Err(e) => {
                    warn!(host = %host, error = %e, "Ignoring malformed Host header");
                    self.fallback_host.clone()
                }
            },
            None => self.fallback_host.clone(),
        }
    }

    /// Names that could never have been published cannot exist either.
    fn require_known_name(package: &str) -> AppResult<()> {
        validation::validate_package_name(package).map_err(|e| {
            debug!(package = %package, error = %e, "Lookup with invalid package name");
            AppError::NotFound(format!("Package not found: {package}"))
        })?;
        Ok(())
    }

    /// Metadata document for `package` with tarball URLs rewritten for `host`.
    ///
    /// The rewrite happens on the in-memory copy only; nothing is persisted.
    pub async fn package_metadata(&self, package: &str, host: Option<&str>) -> AppResult<Value> {
        Self::require_known_name(package)?;

        if !self.storage.package_exists(package).await {
            debug!(package = %package, "Package metadata not found");
            return Err(AppError::NotFound(format!("Package not found: {package}")));
        }

        let mut metadata = self.storage.load_metadata(package).await?;
        if metadata.is_null() {
            return Err(AppError::NotFound(format!("Package not found: {package}")));
        }

        let host = self.resolve_host(host);
        if let Some(versions) = metadata.get_mut("versions").and_then(Value::as_object_mut) {
            for (version, version_meta) in versions.iter_mut() {
                let Some(version_meta) = version_meta.as_object_mut() else {
                    warn!(package = %package, version = %version, "Version metadata is not an object");
                    continue;
                };
                let url = tarball_url(&host, package, &tarball_filename(package, version));
                object_entry(version_meta, "dist").insert("tarball".to_string(), Value::String(url));
            }
        }

        debug!(package = %package, host = %host, "Serving package metadata");
        Ok(metadata)
    }

    /// Raw bytes of a stored tarball.
    pub async fn tarball(&self, package: &str, filename: &str) -> AppResult<Vec<u8>> {
        Self::require_known_name(package)?;
        validation::validate_filename(filename)?;

        if !self.storage.tarball_exists(package, filename).await {
            debug!(package = %package, filename = %filename, "Tarball not found");
            return Err(AppError::NotFound(format!(
                "Tarball not found: {package}/-/{filename}"
            )));
        }

        let data = self.storage.read_tarball(package, filename).await?;
        debug!(package = %package, filename = %filename, size = data.len(), "Serving tarball");
        Ok(data)
    }

    /// Stub login: the credentials are read but never checked and every
    /// caller receives the same configured token. This is not an
    /// authentication boundary; no route ever verifies the token.
    pub fn login(&self, request: &LoginRequest) -> LoginResponse {
        info!(user = %request.name, "Login accepted (no authentication configured)");
        LoginResponse {
            token: self.login_token.clone(),
        }
    }

    pub async fn package_count(&self) -> AppResult<usize> {
        Ok(self.storage.list_packages().await?.len())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::FsStorage;
    use serde_json::json;
    use tempfile::TempDir;

    pub(crate) fn test_registry() -> (NpmRegistry, FsStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path().join("registry_data"));
        let registry = NpmRegistry::new(
            Arc::new(storage.clone()),
            "localhost:8080".to_string(),
            "test-token".to_string(),
        );
        (registry, storage, temp_dir)
    }

    #[test]
    fn test_tarball_url() {
        assert_eq!(
            tarball_url("example.com:3000", "demo", "demo-1.0.0.tgz"),
            "http://example.com:3000/demo/-/demo-1.0.0.tgz"
        );
    }

    #[test]
    fn test_resolve_host() {
        let (registry, _storage, _temp_dir) = test_registry();
        assert_eq!(registry.resolve_host(Some("npm.internal")), "npm.internal");
        assert_eq!(registry.resolve_host(None), "localhost:8080");
        assert_eq!(
            registry.resolve_host(Some("evil.com/steal?")),
            "localhost:8080"
        );
    }

    #[tokio::test]
    async fn test_metadata_rewrites_every_tarball_url() {
        let (registry, storage, _temp_dir) = test_registry();
        storage
            .save_metadata(
                "demo",
                &json!({
                    "name": "demo",
                    "versions": {
                        "1.0.0": {"dist": {"tarball": "http://stale/demo.tgz", "shasum": "abc"}},
                        "2.0.0": {"description": "no dist yet"}
                    },
                    "dist-tags": {"latest": "2.0.0"}
                }),
            )
            .await
            .unwrap();

        let metadata = registry
            .package_metadata("demo", Some("registry.local:9000"))
            .await
            .unwrap();

        assert_eq!(
            metadata["versions"]["1.0.0"]["dist"]["tarball"],
            "http://registry.local:9000/demo/-/demo-1.0.0.tgz"
        );
        assert_eq!(metadata["versions"]["1.0.0"]["dist"]["shasum"], "abc");
        assert_eq!(
            metadata["versions"]["2.0.0"]["dist"]["tarball"],
            "http://registry.local:9000/demo/-/demo-2.0.0.tgz"
        );

        // Stored document is untouched
        let stored = storage.load_metadata("demo").await.unwrap();
        assert_eq!(
            stored["versions"]["1.0.0"]["dist"]["tarball"],
            "http://stale/demo.tgz"
        );
    }

    #[tokio::test]
    async fn test_metadata_for_unknown_package_is_not_found() {
        let (registry, _storage, _temp_dir) = test_registry();
        let err = registry.package_metadata("ghost", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = registry.package_metadata("../etc", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_corrupt_metadata_surfaces_as_internal_error() {
        let (registry, storage, _temp_dir) = test_registry();
        std::fs::create_dir_all(storage.package_dir("demo")).unwrap();
        std::fs::write(storage.metadata_path("demo"), "not json").unwrap();

        let err = registry.package_metadata("demo", None).await.unwrap_err();
        assert_eq!(err.error_code(), crate::error::ErrorCode::InternalError);
    }

    #[tokio::test]
    async fn test_tarball_lookup() {
        let (registry, storage, _temp_dir) = test_registry();
        storage
            .write_tarball("demo", "demo-1.0.0.tgz", b"hello")
            .await
            .unwrap();

        assert_eq!(
            registry.tarball("demo", "demo-1.0.0.tgz").await.unwrap(),
            b"hello"
        );
        assert!(matches!(
            registry.tarball("demo", "demo-2.0.0.tgz").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            registry.tarball("demo", "../demo/metadata.json").await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_login_returns_configured_token() {
        let (registry, _storage, _temp_dir) = test_registry();
        let response = registry.login(&LoginRequest {
            name: "alice".to_string(),
            password: "wrong".to_string(),
        });
        assert_eq!(response.token, "test-token");
    }
}
