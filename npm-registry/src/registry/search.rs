//! Aggregate read endpoints: text search and the full listing.
//!
//! Both scan every package directory and re-read each metadata document.
//! A package that fails to load never fails the aggregate response: search
//! leaves it out, the full listing puts a placeholder string in its slot.

use serde_json::{json, Map, Value};
use tracing::debug;

use super::NpmRegistry;
use crate::error::AppResult;
use crate::types::{SearchObject, SearchPackage, SearchResponse, SearchScore};

/// Stands in for a package whose metadata could not be loaded in `/-/all`.
pub const METADATA_ERROR_PLACEHOLDER: &str = "Error loading metadata";

/// Every match scores the same; results carry no ranking.
const FIXED_SCORE: f64 = 1.0;

fn search_object(name: &str, metadata: &Value) -> Option<SearchObject> {
    let latest = metadata.get("dist-tags")?.get("latest")?.as_str()?;
    let version_info = metadata.get("versions")?.get(latest)?.as_object()?;

    // Absent fields take defaults; present fields of the wrong type disqualify
    let description = match version_info.get("description") {
        None => String::new(),
        Some(description) => description.as_str()?.to_string(),
    };
    let keywords = match version_info.get("keywords") {
        None => json!([]),
        Some(keywords) if keywords.is_array() => keywords.clone(),
        Some(_) => return None,
    };

    Some(SearchObject {
        package: SearchPackage {
            name: name.to_string(),
            version: latest.to_string(),
            description,
            keywords,
        },
        score: SearchScore {
            final_score: FIXED_SCORE,
        },
    })
}

impl NpmRegistry {
    /// Packages whose name contains `text` (case-sensitive), sorted by name.
    /// An empty `text` matches every package.
    pub async fn search(&self, text: &str) -> AppResult<SearchResponse> {
        let mut objects = Vec::new();

        for name in self.storage.list_packages().await? {
            if !name.contains(text) {
                continue;
            }

            match self.storage.load_metadata(&name).await {
                Ok(metadata) => match search_object(&name, &metadata) {
                    Some(object) => objects.push(object),
                    None => {
                        debug!(package = %name, "Skipping package without a resolvable latest version")
                    }
                },
                Err(e) => debug!(package = %name, error = %e, "Skipping unreadable package"),
            }
        }

        debug!(text = %text, total = objects.len(), "Search completed");
        Ok(SearchResponse {
            total: objects.len(),
            objects,
        })
    }

    /// Every package's stored metadata keyed by name.
    pub async fn all_packages(&self) -> AppResult<Map<String, Value>> {
        let mut all = Map::new();

        for name in self.storage.list_packages().await? {
            let metadata = match self.storage.load_metadata(&name).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!(package = %name, error = %e, "Metadata failed to load for listing");
                    Value::String(METADATA_ERROR_PLACEHOLDER.to_string())
                }
            };
            all.insert(name, metadata);
        }

        Ok(all)
    }
}
