//! Publishing: `PUT /{package}` and raw tarball uploads.
//!
//! A publish payload carries exactly one version plus its tarball as a
//! base64 attachment named `<package>-<version>.tgz`. The tarball is written
//! first, then the version is merged into the stored document and
//! `dist-tags.latest` is pointed at it. Both steps run under the package's
//! lock.

use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::{object_entry, NpmRegistry};
use crate::error::{AppError, AppResult};
use crate::storage::tarball_filename;
use crate::types::{Attachment, PublishPayload};
use crate::validation::{self, ValidationError};

fn size_error(e: ValidationError) -> AppError {
    match e {
        ValidationError::TooLarge { actual, max } => AppError::PayloadTooLarge(format!(
            "Tarball too large: {actual} bytes exceeds limit of {max} bytes"
        )),
        other => AppError::Validation(other),
    }
}

impl NpmRegistry {
    fn decode_attachment(&self, filename: &str, attachment: &Value) -> AppResult<Vec<u8>> {
        let attachment: Attachment = serde_json::from_value(attachment.clone()).map_err(|_| {
            AppError::BadRequest(format!(
                "Attachment '{filename}' has no base64 'data' field"
            ))
        })?;

        validation::validate_base64_size(&attachment.data, self.max_tarball_size)
            .map_err(size_error)?;
        validation::validate_base64_characters(&attachment.data)?;

        let tarball = general_purpose::STANDARD.decode(&attachment.data)?;
        validation::validate_size(tarball.len() as u64, self.max_tarball_size).map_err(size_error)?;
        Ok(tarball)
    }

    /// Publish one version of `package` from a raw JSON request body.
    ///
    /// Returns the published version. Payloads with zero or several entries
    /// under `versions` are rejected before anything is written.
    pub async fn publish(&self, package: &str, body: &[u8]) -> AppResult<String> {
        validation::validate_package_name(package)?;

        let payload: PublishPayload = serde_json::from_slice(body)?;
        if payload.versions.len() != 1 {
            warn!(package = %package, count = payload.versions.len(), "Rejecting publish without exactly one version");
            return Err(AppError::BadRequest(format!(
                "Publish payload must contain exactly one version, found {}",
                payload.versions.len()
            )));
        }

        let Some((version, version_meta)) = payload.versions.into_iter().next() else {
            return Err(AppError::BadRequest(
                "Publish payload contains no versions".to_string(),
            ));
        };
        validation::validate_version(&version)?;
        if !version_meta.is_object() {
            return Err(AppError::BadRequest(format!(
                "Metadata for version '{version}' must be a JSON object"
            )));
        }

        let filename = tarball_filename(package, &version);
        validation::validate_filename(&filename)?;

        let attachment = payload.attachments.get(&filename).ok_or_else(|| {
            warn!(package = %package, filename = %filename, "Publish payload lacks the expected attachment");
            AppError::BadRequest(format!("Missing attachment '{filename}'"))
        })?;
        let tarball = self.decode_attachment(&filename, attachment)?;
        debug!(package = %package, version = %version, size = tarball.len(), "Decoded tarball attachment");

        let _guard = self.locks.acquire(package).await;

        self.storage
            .write_tarball(package, &filename, &tarball)
            .await?;

        let mut metadata = if self.storage.package_exists(package).await {
            let existing = self.storage.load_metadata(package).await?;
            // An existing document that cannot be read must never be replaced
            if existing.is_null() {
                error!(package = %package, "Existing metadata could not be read, refusing to overwrite");
                return Err(AppError::InternalError(format!(
                    "Metadata for package '{package}' exists but could not be read"
                )));
            }
            existing
        } else {
            json!({ "name": package, "versions": {} })
        };
        let document = metadata.as_object_mut().ok_or_else(|| {
            AppError::InternalError(format!(
                "Metadata for package '{package}' is not a JSON object"
            ))
        })?;

        object_entry(document, "versions").insert(version.clone(), version_meta);
        object_entry(document, "dist-tags")
            .insert("latest".to_string(), Value::String(version.clone()));

        self.storage.save_metadata(package, &metadata).await?;

        info!(package = %package, version = %version, filename = %filename, "Package published");
        Ok(version)
    }

    /// Store a tarball sent as a raw request body.
    pub async fn upload_tarball(&self, package: &str, filename: &str, data: &[u8]) -> AppResult<()> {
        validation::validate_package_name(package)?;
        validation::validate_filename(filename)?;
        if !filename.ends_with(".tgz") {
            return Err(AppError::BadRequest(format!(
                "Tarball filename must end with .tgz: {filename}"
            )));
        }
        validation::validate_size(data.len() as u64, self.max_tarball_size).map_err(size_error)?;

        self.storage.write_tarball(package, filename, data).await?;
        info!(package = %package, filename = %filename, size = data.len(), "Tarball uploaded");
        Ok(())
    }
}
