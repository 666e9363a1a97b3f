//! Request and response bodies of the npm registry protocol.
//!
//! Package metadata documents themselves stay untyped (`serde_json::Value`):
//! version entries are free-form and must round-trip unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `PUT /{package}`.
#[derive(Debug, Deserialize)]
pub struct PublishPayload {
    pub versions: Map<String, Value>,
    #[serde(rename = "_attachments", default)]
    pub attachments: Map<String, Value>,
}

/// One entry of `_attachments`.
#[derive(Debug, Deserialize)]
pub struct Attachment {
    pub data: String,
}

/// Query string of `GET /-/v1/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub objects: Vec<SearchObject>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchObject {
    pub package: SearchPackage,
    pub score: SearchScore,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchPackage {
    pub name: String,
    pub version: String,
    pub description: String,
    pub keywords: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchScore {
    #[serde(rename = "final")]
    pub final_score: f64,
}

/// Credentials sent by `npm login`. They are accepted but never verified.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
}

/// Response of the CouchDB-style `PUT /-/user/{user}` login.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserLoginResponse {
    pub ok: bool,
    pub id: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WhoamiResponse {
    pub username: String,
}
