//! Twirp (JSON over HTTP) client for the results cache service.

use super::check_status;
use crate::backend::{BackendError, CacheEntry, CacheService};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const CACHE_SERVICE: &str = "github.actions.results.api.v1.CacheService";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetCacheEntryDownloadUrlRequest<'a> {
    key: &'a str,
    restore_keys: &'a [String],
    version: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct GetCacheEntryDownloadUrlResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default, rename = "signedDownloadUrl", alias = "signed_download_url")]
    signed_download_url: String,
    #[serde(default, rename = "matchedKey", alias = "matched_key")]
    matched_key: String,
}

#[derive(Serialize)]
struct CreateCacheEntryRequest<'a> {
    key: &'a str,
    version: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct CreateCacheEntryResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default, rename = "signedUploadUrl", alias = "signed_upload_url")]
    signed_upload_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinalizeCacheEntryUploadRequest<'a> {
    key: &'a str,
    version: &'a str,
    // int64 travels as a decimal string in the JSON mapping.
    size_bytes: String,
}

#[derive(Deserialize, Debug, Default)]
struct FinalizeCacheEntryUploadResponse {
    #[serde(default)]
    ok: bool,
}

pub struct TwirpCacheService {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TwirpCacheService {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("actions-cache-shim/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url, token))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        TwirpCacheService {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/twirp/{CACHE_SERVICE}/{method}", self.base_url)
    }

    async fn call<Req, Resp>(
        &self,
        operation: &'static str,
        method: &str,
        request: &Req,
    ) -> Result<Resp, BackendError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        tracing::debug!(operation, method, "calling cache service");
        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::unavailable(operation, e))?;

        check_status(operation, response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::unavailable(operation, e))
    }
}

#[async_trait::async_trait]
impl CacheService for TwirpCacheService {
    async fn lookup(
        &self,
        key: &str,
        restore_keys: &[String],
        version: &str,
    ) -> Result<Option<CacheEntry>, BackendError> {
        let response: GetCacheEntryDownloadUrlResponse = self
            .call(
                "lookup",
                "GetCacheEntryDownloadURL",
                &GetCacheEntryDownloadUrlRequest {
                    key,
                    restore_keys,
                    version,
                },
            )
            .await?;

        if !response.ok {
            return Ok(None);
        }
        Ok(Some(CacheEntry {
            matched_key: response.matched_key,
            download_url: response.signed_download_url,
        }))
    }

    async fn reserve(&self, key: &str, version: &str) -> Result<String, BackendError> {
        let response: CreateCacheEntryResponse = self
            .call(
                "reserve",
                "CreateCacheEntry",
                &CreateCacheEntryRequest { key, version },
            )
            .await?;

        if !response.ok {
            return Err(BackendError::rejected(
                "reserve",
                format!("cache entry for key `{key}` could not be created"),
            ));
        }
        if response.signed_upload_url.is_empty() {
            return Err(BackendError::unavailable(
                "reserve",
                "response did not include an upload URL",
            ));
        }
        Ok(response.signed_upload_url)
    }

    async fn finalize(
        &self,
        key: &str,
        version: &str,
        size_bytes: u64,
    ) -> Result<(), BackendError> {
        let response: FinalizeCacheEntryUploadResponse = self
            .call(
                "finalize",
                "FinalizeCacheEntryUpload",
                &FinalizeCacheEntryUploadRequest {
                    key,
                    version,
                    size_bytes: size_bytes.to_string(),
                },
            )
            .await?;

        if !response.ok {
            return Err(BackendError::rejected(
                "finalize",
                format!("upload for key `{key}` could not be finalized"),
            ));
        }
        Ok(())
    }
}
