use super::BackendError;

pub mod block_blob;
pub mod twirp;

/// Passes 2xx responses through; anything else becomes a [`BackendError`].
/// Client errors mean the backend declined, server errors are worth a retry.
async fn check_status(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reason = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };

    if status.is_client_error() {
        Err(BackendError::rejected(operation, reason))
    } else {
        Err(BackendError::unavailable(operation, reason))
    }
}
