use crate::backend::BackendError;
use crate::backend::driver::block_blob::new_block_id;
use crate::domain::reservation::{CacheId, Reservation, SealError, StagedBlock};
use crate::error::AppError;
use crate::utils::content_range::ContentRange;
use crate::utils::state::AppState;
use crate::utils::version::namespaced_version;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::WithRejection;
use axum_extra::headers::{ContentLength, ContentType, HeaderMapExt};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize, Debug)]
pub struct GetCacheEntryQuery {
    /// Primary key first, then restore keys, comma separated on the wire.
    /// Keys are passed on exactly as sent, surrounding whitespace included.
    #[serde(deserialize_with = "comma_separated")]
    pub keys: Vec<String>,
    pub version: String,
}

fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .filter(|key| !key.is_empty())
        .map(String::from)
        .collect())
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCacheEntry {
    pub cache_key: String,
    pub scope: String,
    pub archive_location: String,
}

#[derive(Deserialize, Debug)]
pub struct ReserveCacheRequest {
    pub key: String,
    pub version: String,
}

#[derive(Serialize, Debug)]
pub struct ReserveCacheResponse {
    #[serde(rename = "cacheID")]
    pub cache_id: CacheId,
}

#[derive(Deserialize, Debug)]
pub struct CommitCacheRequest {
    pub size: u64,
}

/// GET /_apis/artifactcache/cache
pub async fn get_cache_entry_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<GetCacheEntryQuery>, AppError>,
) -> Result<Response, AppError> {
    let (primary_key, restore_keys) = query
        .keys
        .split_first()
        .ok_or_else(|| AppError::BadRequest("at least one key is required".to_string()))?;

    let entry = state
        .cache_service
        .lookup(primary_key, restore_keys, &namespaced_version(&query.version))
        .await?;

    match entry {
        Some(entry) => {
            tracing::info!(key = %primary_key, matched_key = %entry.matched_key, "cache hit");
            Ok(Json(ArtifactCacheEntry {
                cache_key: entry.matched_key,
                scope: String::new(),
                archive_location: entry.download_url,
            })
            .into_response())
        }
        None => {
            tracing::info!(key = %primary_key, "cache miss");
            Ok((StatusCode::NOT_FOUND, Json(json!({}))).into_response())
        }
    }
}

/// POST /_apis/artifactcache/caches
pub async fn reserve_cache_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<ReserveCacheRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    if req.key.is_empty() {
        return Err(AppError::BadRequest("key must not be empty".to_string()));
    }

    let upload_url = state
        .cache_service
        .reserve(&req.key, &namespaced_version(&req.version))
        .await?;

    let cache_id = state
        .reservations
        .allocate(Reservation::new(req.key.clone(), req.version, upload_url))
        .await;
    tracing::info!(%cache_id, key = %req.key, "cache reserved");

    Ok(Json(ReserveCacheResponse { cache_id }))
}

/// PATCH /_apis/artifactcache/caches/<cache_id>
pub async fn upload_cache_chunk_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(cache_id), _): WithRejection<Path<CacheId>, AppError>,
    headers: HeaderMap,
    request: Request,
) -> Result<StatusCode, AppError> {
    let reservation = state
        .reservations
        .get(cache_id)
        .await
        .ok_or(AppError::CacheUnknown(cache_id))?;

    if headers.typed_get::<ContentType>() != Some(ContentType::octet_stream()) {
        return Err(AppError::ContentTypeInvalid);
    }

    let range = ContentRange::from_headers(&headers)?;
    if let Some(ContentLength(content_length)) = headers.typed_get::<ContentLength>()
        && content_length != range.size()
    {
        return Err(AppError::SizeInvalid(format!(
            "Content-Length {content_length} does not match Content-Range size {}",
            range.size()
        )));
    }

    let max_chunk_size = state.config.max_chunk_size;
    let data = axum::body::to_bytes(request.into_body(), max_chunk_size)
        .await
        .map_err(|e| {
            AppError::SizeInvalid(format!(
                "chunk body could not be read within {max_chunk_size} bytes: {e}"
            ))
        })?;
    if data.len() as u64 != range.size() {
        return Err(AppError::SizeInvalid(format!(
            "received {} bytes for a {} byte range",
            data.len(),
            range.size()
        )));
    }

    if reservation.is_sealed().await {
        return Err(AppError::CommitInProgress(cache_id));
    }

    let block_id = new_block_id();
    state
        .blob_store
        .stage_block(&reservation.upload_url, &block_id, data)
        .await?;
    // A commit may have sealed the reservation while the block was staging.
    reservation
        .append_block(StagedBlock::new(block_id, &range))
        .await
        .map_err(|_| AppError::CommitInProgress(cache_id))?;

    tracing::info!(%cache_id, start = range.start(), end = range.end(), "chunk staged");
    Ok(StatusCode::OK)
}

/// POST /_apis/artifactcache/caches/<cache_id>
pub async fn commit_cache_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(cache_id), _): WithRejection<Path<CacheId>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<CommitCacheRequest>, AppError>,
) -> Result<StatusCode, AppError> {
    let reservation = state
        .reservations
        .get(cache_id)
        .await
        .ok_or(AppError::CacheUnknown(cache_id))?;

    // A size mismatch leaves the reservation open for more chunks.
    let block_ids = reservation.seal(req.size).await.map_err(|e| match e {
        SealError::Sealed(_) => AppError::CommitInProgress(cache_id),
        SealError::SizeMismatch(mismatch) => mismatch.into(),
    })?;

    if let Err(err) = commit_blocks(&state, &reservation, &block_ids, req.size).await {
        if err.is_rejection() {
            state.reservations.delete(cache_id).await;
            tracing::warn!(%cache_id, operation = err.operation(), "commit rejected, reservation dropped");
        } else {
            reservation.unseal().await;
        }
        return Err(err.into());
    }

    state.reservations.delete(cache_id).await;
    tracing::info!(%cache_id, key = %reservation.key, size = req.size, blocks = block_ids.len(), "cache committed");
    Ok(StatusCode::OK)
}

async fn commit_blocks(
    state: &AppState,
    reservation: &Reservation,
    block_ids: &[String],
    size: u64,
) -> Result<(), BackendError> {
    state
        .blob_store
        .commit_block_list(&reservation.upload_url, block_ids)
        .await?;
    state
        .cache_service
        .finalize(
            &reservation.key,
            &namespaced_version(&reservation.version),
            size,
        )
        .await
}
