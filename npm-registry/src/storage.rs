//! # Package Storage
//!
//! Filesystem layout, one directory per package under the data root:
//!
//! ```text
//! <root>/<package>/metadata.json
//! <root>/<package>/<package>-<version>.tgz
//! ```
//!
//! The metadata document is the only record of a package's versions and tags
//! and is treated as an opaque JSON tree here. Every write goes to a temporary
//! file in the package directory which is then renamed over the target, so
//! readers see either the old or the new file, never a partial one.
//!
//! Storage does no locking. Callers that read-modify-write a document must
//! serialize themselves (see [`crate::locks::PackageLocks`]).

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

pub const METADATA_FILE: &str = "metadata.json";

/// Deterministic artifact filename for a package version.
pub fn tarball_filename(package: &str, version: &str) -> String {
    format!("{package}-{version}.tgz")
}

/// Persistence capability used by the registry.
#[async_trait]
pub trait PackageStorage: Send + Sync {
    /// True iff the package's metadata document exists.
    async fn package_exists(&self, package: &str) -> bool;

    /// Load a package's metadata document.
    ///
    /// A missing or unreadable file yields `Value::Null`; callers that care
    /// about the difference check [`PackageStorage::package_exists`] first. A
    /// file that exists but does not parse (including invalid UTF-8) is
    /// [`AppError::CorruptMetadata`].
    async fn load_metadata(&self, package: &str) -> AppResult<Value>;

    /// Replace a package's metadata document, creating its directory if needed.
    async fn save_metadata(&self, package: &str, metadata: &Value) -> AppResult<()>;

    async fn tarball_exists(&self, package: &str, filename: &str) -> bool;

    async fn read_tarball(&self, package: &str, filename: &str) -> AppResult<Vec<u8>>;

    /// Write an artifact, replacing any existing file of the same name.
    async fn write_tarball(&self, package: &str, filename: &str, data: &[u8]) -> AppResult<()>;

    /// Names of all package directories, sorted.
    async fn list_packages(&self) -> AppResult<Vec<String>>;
}

/// [`PackageStorage`] backed by a directory tree.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join path segments onto the storage root. No I/O.
    pub fn resolve_path<I, S>(&self, segments: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        segments
            .into_iter()
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.resolve_path([package])
    }

    pub fn metadata_path(&self, package: &str) -> PathBuf {
        self.resolve_path([package, METADATA_FILE])
    }

    pub fn tarball_path(&self, package: &str, filename: &str) -> PathBuf {
        self.resolve_path([package, filename])
    }
}

/// Write `content` next to `path` and atomically rename it into place.
async fn write_atomic(path: PathBuf, content: Vec<u8>) -> AppResult<()> {
    tokio::task::spawn_blocking(move || -> AppResult<()> {
        let dir = path.parent().ok_or_else(|| {
            AppError::InternalError(format!("No parent directory for {}", path.display()))
        })?;
        std::fs::create_dir_all(dir)?;

        let mut temp_file = tempfile::Builder::new()
            .prefix(".write-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp_file.write_all(&content)?;
        temp_file.as_file().sync_all()?;

        temp_file.persist(&path).map_err(|e| AppError::Io(e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Write task failed: {e}")))?
}

#[async_trait]
impl PackageStorage for FsStorage {
    async fn package_exists(&self, package: &str) -> bool {
        fs::try_exists(self.metadata_path(package))
            .await
            .unwrap_or(false)
    }

    async fn load_metadata(&self, package: &str) -> AppResult<Value> {
        let path = self.metadata_path(package);
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(package = %package, path = %path.display(), error = %e, "Metadata unreadable, treating as absent");
                }
                return Ok(Value::Null);
            }
        };

        serde_json::from_slice(&content).map_err(|source| AppError::CorruptMetadata {
            package: package.to_string(),
            source,
        })
    }

    async fn save_metadata(&self, package: &str, metadata: &Value) -> AppResult<()> {
        let path = self.metadata_path(package);
        let content = serde_json::to_vec_pretty(metadata)?;
        let size = content.len();
        write_atomic(path, content).await?;
        debug!(package = %package, size, "Metadata saved");
        Ok(())
    }

    async fn tarball_exists(&self, package: &str, filename: &str) -> bool {
        fs::try_exists(self.tarball_path(package, filename))
            .await
            .unwrap_or(false)
    }

    async fn read_tarball(&self, package: &str, filename: &str) -> AppResult<Vec<u8>> {
        match fs::read(self.tarball_path(package, filename)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound(format!(
                "Tarball not found: {package}/-/{filename}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_tarball(&self, package: &str, filename: &str, data: &[u8]) -> AppResult<()> {
        write_atomic(self.tarball_path(package, filename), data.to_vec()).await?;
        info!(package = %package, filename = %filename, size = data.len(), "Tarball stored");
        Ok(())
    }

    async fn list_packages(&self) -> AppResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut packages = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => packages.push(name),
                Err(name) => {
                    debug!(name = ?name, "Skipping non UTF-8 directory name");
                }
            }
        }

        packages.sort();
        Ok(packages)
    }
}
