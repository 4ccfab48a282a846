use crate::service::cache::{
    commit_cache_handler, get_cache_entry_handler, reserve_cache_handler,
    upload_cache_chunk_handler,
};
use crate::utils::state::AppState;
use axum::Router;
use axum::routing::{get, patch, post};
use std::sync::Arc;

pub fn create_artifact_cache_router() -> Router<Arc<AppState>> {
    Router::new()
        // Look up a cache entry by key and version
        .route("/cache", get(get_cache_entry_handler))
        // Reserve a key for upload
        .route("/caches", post(reserve_cache_handler))
        // Upload a chunk / commit the upload
        .route(
            "/caches/{cache_id}",
            patch(upload_cache_chunk_handler).post(commit_cache_handler),
        )
}
