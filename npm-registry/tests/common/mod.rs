//! Common test utilities and helpers

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum_test::TestServer;
use base64::{engine::general_purpose, Engine as _};
use npm_registry::{build_router, AppState, Config};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Test server setup result
pub struct TestSetup {
    pub temp_dir: TempDir,
    pub server: TestServer,
    pub data_dir: PathBuf,
}

/// Full application router over a fresh data directory.
pub fn create_test_setup() -> TestSetup {
    create_test_setup_with(|_| {})
}

/// Like [`create_test_setup`], with a hook to adjust the configuration.
pub fn create_test_setup_with(configure: impl FnOnce(&mut Config)) -> TestSetup {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("registry_data");

    let mut config = Config::default();
    config.storage.data_dir = data_dir.clone();
    config.security.login_token = "integration-token".to_string();
    configure(&mut config);

    let app = build_router(Arc::new(AppState::from_config(config)));
    let server = TestServer::new(app).unwrap();

    TestSetup {
        temp_dir,
        server,
        data_dir,
    }
}

/// Publish body as `npm publish` sends it.
pub fn publish_payload(package: &str, version: &str, description: &str, tarball: &[u8]) -> Value {
    let filename = format!("{package}-{version}.tgz");
    json!({
        "_id": package,
        "name": package,
        "description": description,
        "dist-tags": { "latest": version },
        "versions": {
            version: {
                "name": package,
                "version": version,
                "description": description,
                "keywords": ["test"],
                "dist": {
                    "tarball": format!("http://registry.npmjs.org/{package}/-/{filename}")
                }
            }
        },
        "_attachments": {
            filename: {
                "content_type": "application/octet-stream",
                "data": general_purpose::STANDARD.encode(tarball),
                "length": tarball.len()
            }
        }
    })
}

pub async fn publish(server: &TestServer, package: &str, version: &str, tarball: &[u8]) {
    server
        .put(&format!("/{package}"))
        .json(&publish_payload(package, version, "Test package", tarball))
        .await
        .assert_status_ok();
}
