//! # npm Registry Server
//!
//! A minimal registry speaking the subset of the npm protocol that `npm
//! install`, `npm publish`, `npm search` and `npm login` need. Packages live
//! on the local filesystem, one directory per package holding a
//! `metadata.json` document and the published tarballs.
//!
//! ## Key Modules
//!
//! - [`storage`]: on-disk layout and atomic metadata persistence
//! - [`registry`]: protocol semantics, independent of HTTP
//! - [`npm`]: axum handlers for the protocol routes
//! - [`server`]: router construction and the listen loop
//! - [`config`]: JSON configuration with per-section defaults
//! - [`error`]: error classification and JSON error bodies
//! - [`validation`]: input validation for names, versions, paths and sizes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use npm_registry::{build_router, AppState, Config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let state = Arc::new(AppState::from_config(Config::default()));
//! let app = build_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod locks;
pub mod npm;
pub mod registry;
pub mod server;
pub mod state;
pub mod storage;
pub mod types;
pub mod validation;

pub use config::Config;
pub use error::{ApiErrorResponse, AppError, AppResult, ErrorCode};
pub use registry::NpmRegistry;
pub use server::{build_router, run_server};
pub use state::{AppState, SuccessResponse};
pub use storage::{FsStorage, PackageStorage};
pub use validation::{ValidationError, ValidationResult};
