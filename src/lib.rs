//! Serves the legacy artifact cache REST API (`/_apis/artifactcache`) and
//! carries every operation over to the RPC cache service and block blob
//! storage.

pub mod api;
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod utils;

pub use api::create_router;
pub use error::AppError;
pub use utils::state::AppState;
