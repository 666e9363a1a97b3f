//! Axum handlers for the npm registry protocol.
//!
//! Each handler extracts the request parts it needs and delegates to
//! [`NpmRegistry`](crate::registry::NpmRegistry). Errors are returned as
//! [`AppError`](crate::AppError) and rendered by its `IntoResponse` impl.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path as AxumPath, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json},
};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::state::{AppState, SuccessResponse};
use crate::types::{
    LoginRequest, LoginResponse, SearchQuery, SearchResponse, UserLoginResponse, WhoamiResponse,
};

fn host_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|v| v.to_str().ok())
}

/// Login bodies are read leniently; a missing or malformed body still logs in.
fn login_request(body: &[u8]) -> LoginRequest {
    serde_json::from_slice(body).unwrap_or_default()
}

/// Package metadata with tarball URLs pointing back at the host the client used.
///
/// # Route
/// `GET /{package}`
pub async fn package_metadata(
    AxumPath(package): AxumPath<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    debug!(package = %package, "Incoming metadata request");
    let metadata = state
        .registry
        .package_metadata(&package, host_header(&headers))
        .await?;
    Ok(Json(metadata))
}

/// Raw tarball bytes.
///
/// # Route
/// `GET /{package}/-/{filename}`
pub async fn download_tarball(
    AxumPath((package, filename)): AxumPath<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> AppResult<impl IntoResponse> {
    debug!(package = %package, filename = %filename, "Incoming tarball download request");
    let data = state.registry.tarball(&package, &filename).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}

/// Publish a single version.
///
/// # Route
/// `PUT /{package}`
///
/// # Payload Structure
/// ```json
/// {
///   "name": "package-name",
///   "versions": {
///     "1.0.0": { "name": "package-name", "version": "1.0.0" }
///   },
///   "_attachments": {
///     "package-name-1.0.0.tgz": { "data": "base64-encoded-tarball" }
///   }
/// }
/// ```
///
/// The body is taken as raw bytes so that malformed JSON is reported through
/// the registry's own error body rather than axum's extractor rejection.
pub async fn publish_package(
    AxumPath(package): AxumPath<String>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<SuccessResponse>> {
    debug!(package = %package, size = body.len(), "Incoming publish request");
    state.registry.publish(&package, &body).await?;
    Ok(Json(SuccessResponse {
        message: "Package published".to_string(),
    }))
}

/// # Route
/// `PUT /{package}/-/{filename}`
pub async fn upload_tarball(
    AxumPath((package, filename)): AxumPath<(String, String)>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<SuccessResponse>> {
    state
        .registry
        .upload_tarball(&package, &filename, &body)
        .await?;
    Ok(Json(SuccessResponse {
        message: "Tarball uploaded".to_string(),
    }))
}

/// # Route
/// `GET /-/v1/search?text=<substring>`
pub async fn search(
    Query(query): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<SearchResponse>> {
    Ok(Json(state.registry.search(&query.text).await?))
}

/// # Route
/// `GET /-/all`
pub async fn list_all(State(state): State<Arc<AppState>>) -> AppResult<Json<Map<String, Value>>> {
    Ok(Json(state.registry.all_packages().await?))
}

/// # Route
/// `POST /-/v1/login`
pub async fn login(State(state): State<Arc<AppState>>, body: Bytes) -> Json<LoginResponse> {
    Json(state.registry.login(&login_request(&body)))
}

/// CouchDB-style login used by older npm clients.
///
/// # Route
/// `PUT /-/user/{user}`
pub async fn user_login(
    AxumPath(user): AxumPath<String>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<UserLoginResponse> {
    let mut request = login_request(&body);
    if request.name.is_empty() {
        request.name = user.trim_start_matches("org.couchdb.user:").to_string();
    }
    let LoginResponse { token } = state.registry.login(&request);
    info!(user = %request.name, "CouchDB-style login");
    Json(UserLoginResponse {
        ok: true,
        id: format!("org.couchdb.user:{}", request.name),
        token,
    })
}

/// # Route
/// `GET /-/whoami`
pub async fn whoami() -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        username: "anonymous".to_string(),
    })
}

/// # Route
/// `GET /-/ping`
pub async fn ping() -> Json<Value> {
    Json(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::http::StatusCode;
    use axum::routing::{get, post, put};
    use axum_test::TestServer;
    use base64::{engine::general_purpose, Engine as _};
    use tempfile::TempDir;

    fn create_test_state() -> (Arc<AppState>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = temp_dir.path().join("data");
        config.security.login_token = "test-token".to_string();
        (Arc::new(AppState::from_config(config)), temp_dir)
    }

    fn create_publish_payload(package: &str, version: &str, tarball: &[u8]) -> Value {
        let filename = format!("{package}-{version}.tgz");
        json!({
            "_id": package,
            "name": package,
            "versions": {
                version: {
                    "name": package,
                    "version": version,
                    "description": "Test package",
                    "dist": { "tarball": format!("http://elsewhere/{package}/-/{filename}") }
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

    fn test_server(state: Arc<AppState>) -> TestServer {
        let app = axum::Router::new()
            .route("/{package}", get(package_metadata).put(publish_package))
            .route(
                "/{package}/-/{filename}",
                get(download_tarball).put(upload_tarball),
            )
            .route("/-/v1/search", get(search))
            .route("/-/all", get(list_all))
            .route("/-/v1/login", post(login))
            .route("/-/user/{user}", put(user_login))
            .with_state(state);
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_publish_then_fetch() {
        let (state, _temp_dir) = create_test_state();
        let server = test_server(state);

        let response = server
            .put("/test-package")
            .json(&create_publish_payload("test-package", "1.0.0", b"fake tarball"))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: SuccessResponse = response.json();
        assert_eq!(body.message, "Package published");

        let response = server
            .get("/test-package")
            .add_header("host", "example.com:3000")
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["dist-tags"]["latest"], "1.0.0");
        assert_eq!(
            body["versions"]["1.0.0"]["dist"]["tarball"],
            "http://example.com:3000/test-package/-/test-package-1.0.0.tgz"
        );

        let response = server.get("/test-package/-/test-package-1.0.0.tgz").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.as_bytes().to_vec(), b"fake tarball".to_vec());
    }

    #[tokio::test]
    async fn test_publish_rejects_missing_attachment() {
        let (state, _temp_dir) = create_test_state();
        let server = test_server(state);

        let response = server
            .put("/test-package")
            .json(&json!({ "name": "test-package", "versions": { "1.0.0": {} } }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "validation_error");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_publish_rejects_invalid_json() {
        let (state, _temp_dir) = create_test_state();
        let server = test_server(state);

        let response = server.put("/test-package").text("{ nope").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_package_and_tarball_are_not_found() {
        let (state, _temp_dir) = create_test_state();
        let server = test_server(state);

        let response = server.get("/ghost").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["code"], "not_found");

        let response = server.get("/ghost/-/ghost-1.0.0.tgz").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_tarball_route() {
        let (state, _temp_dir) = create_test_state();
        let server = test_server(state);

        let response = server
            .put("/raw/-/raw-0.1.0.tgz")
            .bytes(Bytes::from_static(b"raw bytes"))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let response = server.get("/raw/-/raw-0.1.0.tgz").await;
        assert_eq!(response.as_bytes().to_vec(), b"raw bytes".to_vec());
    }

    #[tokio::test]
    async fn test_search_and_list_all() {
        let (state, _temp_dir) = create_test_state();
        let server = test_server(state);
        for name in ["left-pad", "right-pad", "lodash"] {
            server
                .put(&format!("/{name}"))
                .json(&create_publish_payload(name, "1.0.0", b"x"))
                .await
                .assert_status_ok();
        }

        let response = server.get("/-/v1/search").add_query_param("text", "pad").await;
        let body: SearchResponse = response.json();
        assert_eq!(body.total, 2);
        assert_eq!(body.objects[0].package.name, "left-pad");
        assert_eq!(body.objects[0].package.description, "Test package");

        let body: Value = server.get("/-/v1/search").await.json();
        assert_eq!(body["total"], 3);
        assert_eq!(body["objects"][0]["score"]["final"], 1.0);

        let body: Value = server.get("/-/all").await.json();
        assert_eq!(body.as_object().unwrap().len(), 3);
        assert_eq!(body["lodash"]["name"], "lodash");
    }

    #[tokio::test]
    async fn test_login_ignores_credentials() {
        let (state, _temp_dir) = create_test_state();
        let server = test_server(state);

        let body: LoginResponse = server
            .post("/-/v1/login")
            .json(&json!({ "name": "alice", "password": "wrong" }))
            .await
            .json();
        assert_eq!(body.token, "test-token");

        let response = server.post("/-/v1/login").text("garbage").await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: UserLoginResponse = server
            .put("/-/user/org.couchdb.user:bob")
            .json(&json!({ "password": "x" }))
            .await
            .json();
        assert!(body.ok);
        assert_eq!(body.id, "org.couchdb.user:bob");
        assert_eq!(body.token, "test-token");
    }

    #[tokio::test]
    async fn test_whoami_and_ping() {
        assert_eq!(whoami().await.0.username, "anonymous");
        assert_eq!(ping().await.0, json!({}));
    }
}
