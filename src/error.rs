use crate::backend::BackendError;
use crate::domain::reservation::{CacheId, SizeMismatch};
use crate::utils::content_range::ContentRangeError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("cache {0} is not reserved")]
    CacheUnknown(CacheId),

    #[error("cache {0} is being committed")]
    CommitInProgress(CacheId),

    #[error("Content-Range header is invalid: {0}")]
    ContentRangeInvalid(#[from] ContentRangeError),

    #[error("Content-Type must be application/octet-stream")]
    ContentTypeInvalid,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid content size: {0}")]
    SizeInvalid(String),

    #[error(transparent)]
    SizeMismatch(#[from] SizeMismatch),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AppError {
    fn status_and_type_key(&self) -> (StatusCode, &'static str) {
        match self {
            Self::CacheUnknown(_) => (StatusCode::NOT_FOUND, "CacheNotFoundException"),
            Self::CommitInProgress(_) => (StatusCode::CONFLICT, "CacheCommitInProgressException"),
            // Legacy clients treat a bad range as a server fault and retry it.
            Self::ContentRangeInvalid(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InvalidContentRangeException",
            ),
            Self::ContentTypeInvalid => (StatusCode::BAD_REQUEST, "InvalidContentTypeException"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "ArgumentException"),
            Self::SizeInvalid(_) => (StatusCode::BAD_REQUEST, "InvalidContentSizeException"),
            Self::SizeMismatch(_) => (StatusCode::BAD_REQUEST, "CacheSizeMismatchException"),
            Self::Backend(BackendError::Rejected { .. }) => {
                (StatusCode::BAD_REQUEST, "BackendRejectedException")
            }
            Self::Backend(BackendError::Unavailable { .. }) => {
                (StatusCode::BAD_GATEWAY, "BackendUnavailableException")
            }
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, type_key) = self.status_and_type_key();
        if status_code.is_server_error() {
            tracing::error!("Generating response for AppError: {:?}", self);
        } else {
            tracing::warn!("Generating response for AppError: {:?}", self);
        }

        let body = json!({
            "typeKey": type_key,
            "message": self.to_string(),
        });
        (status_code, Json(body)).into_response()
    }
}
