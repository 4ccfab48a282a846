use axum::body::Bytes;
use thiserror::Error;

pub mod driver;

/// Failure of a downstream call, split by whether retrying can help.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend answered and declined the operation.
    #[error("{operation} was rejected by the backend: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },

    /// The backend could not be reached or failed on its side.
    #[error("{operation} failed to reach the backend: {reason}")]
    Unavailable {
        operation: &'static str,
        reason: String,
    },
}

impl BackendError {
    pub fn rejected(operation: &'static str, reason: impl ToString) -> Self {
        BackendError::Rejected {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn unavailable(operation: &'static str, reason: impl ToString) -> Self {
        BackendError::Unavailable {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, BackendError::Rejected { .. })
    }

    pub fn operation(&self) -> &'static str {
        match self {
            BackendError::Rejected { operation, .. } | BackendError::Unavailable { operation, .. } => {
                operation
            }
        }
    }
}

/// A cache entry found by the cache service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub matched_key: String,
    pub download_url: String,
}

/// The RPC cache service. Versions passed in are already namespaced.
#[async_trait::async_trait]
pub trait CacheService: Send + Sync {
    /// Looks up `key`, then each of `restore_keys` in order. `Ok(None)` is a miss.
    async fn lookup(
        &self,
        key: &str,
        restore_keys: &[String],
        version: &str,
    ) -> Result<Option<CacheEntry>, BackendError>;

    /// Reserves `key` for upload and returns the signed upload URL.
    async fn reserve(&self, key: &str, version: &str) -> Result<String, BackendError>;

    async fn finalize(&self, key: &str, version: &str, size_bytes: u64)
    -> Result<(), BackendError>;
}

/// Block oriented blob storage addressed purely through signed upload URLs.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn stage_block(
        &self,
        upload_url: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<(), BackendError>;

    /// Commits `block_ids`, in the given order, as the content of the blob.
    async fn commit_block_list(
        &self,
        upload_url: &str,
        block_ids: &[String],
    ) -> Result<(), BackendError>;
}
