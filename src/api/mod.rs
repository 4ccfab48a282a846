pub mod artifact_cache;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use crate::utils::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/_apis/artifactcache", artifact_cache::create_artifact_cache_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
