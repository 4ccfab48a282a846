#![allow(dead_code)]

use actions_cache_shim::backend::{BackendError, BlobStore, CacheEntry, CacheService};
use actions_cache_shim::config::Config;
use actions_cache_shim::{AppState, create_router};
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        results_url: "http://results.invalid".to_string(),
        runtime_token: "test-token".to_string(),
        max_chunk_size: 1024 * 1024,
        github_env: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCall {
    Lookup {
        key: String,
        restore_keys: Vec<String>,
        version: String,
    },
    Reserve {
        key: String,
        version: String,
    },
    Finalize {
        key: String,
        version: String,
        size_bytes: u64,
    },
}

/// Cache service that keeps finalized entries in memory.
#[derive(Default)]
pub struct FakeCacheService {
    committed: Mutex<HashMap<(String, String), u64>>,
    calls: Mutex<Vec<CacheCall>>,
    pub reject_finalize: AtomicBool,
}

impl FakeCacheService {
    pub fn calls(&self) -> Vec<CacheCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn committed_size(&self, key: &str, version: &str) -> Option<u64> {
        self.committed
            .lock()
            .unwrap()
            .get(&(key.to_string(), version.to_string()))
            .copied()
    }

    fn upload_url(key: &str) -> String {
        format!("https://blob.example/cache/{key}?sig=write")
    }
}

#[async_trait::async_trait]
impl CacheService for FakeCacheService {
    async fn lookup(
        &self,
        key: &str,
        restore_keys: &[String],
        version: &str,
    ) -> Result<Option<CacheEntry>, BackendError> {
        self.calls.lock().unwrap().push(CacheCall::Lookup {
            key: key.to_string(),
            restore_keys: restore_keys.to_vec(),
            version: version.to_string(),
        });

        let committed = self.committed.lock().unwrap();
        let found = std::iter::once(key)
            .chain(restore_keys.iter().map(String::as_str))
            .find(|candidate| committed.contains_key(&(candidate.to_string(), version.to_string())));
        Ok(found.map(|matched| CacheEntry {
            matched_key: matched.to_string(),
            download_url: format!("https://blob.example/cache/{matched}?sig=read"),
        }))
    }

    async fn reserve(&self, key: &str, version: &str) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(CacheCall::Reserve {
            key: key.to_string(),
            version: version.to_string(),
        });

        if self
            .committed
            .lock()
            .unwrap()
            .contains_key(&(key.to_string(), version.to_string()))
        {
            return Err(BackendError::rejected("reserve", "entry already exists"));
        }
        Ok(Self::upload_url(key))
    }

    async fn finalize(
        &self,
        key: &str,
        version: &str,
        size_bytes: u64,
    ) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(CacheCall::Finalize {
            key: key.to_string(),
            version: version.to_string(),
            size_bytes,
        });

        if self.reject_finalize.load(Ordering::SeqCst) {
            return Err(BackendError::rejected("finalize", "entry already exists"));
        }
        self.committed
            .lock()
            .unwrap()
            .insert((key.to_string(), version.to_string()), size_bytes);
        Ok(())
    }
}

/// Blob store that assembles committed block lists into in-memory blobs.
#[derive(Default)]
pub struct FakeBlobStore {
    staged: Mutex<HashMap<(String, String), Bytes>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    commits: Mutex<Vec<(String, Vec<String>)>>,
    pub fail_stage: AtomicBool,
    pub fail_commit: AtomicBool,
    /// When set, a commit signals `commit_entered` and waits on `commit_release`.
    pub hold_commit: AtomicBool,
    pub commit_entered: Notify,
    pub commit_release: Notify,
}

impl FakeBlobStore {
    pub fn staged_count(&self) -> usize {
        self.staged.lock().unwrap().len()
    }

    pub fn blob(&self, upload_url: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(upload_url).cloned()
    }

    pub fn commits(&self) -> Vec<(String, Vec<String>)> {
        self.commits.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BlobStore for FakeBlobStore {
    async fn stage_block(
        &self,
        upload_url: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<(), BackendError> {
        if self.fail_stage.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("stage block", "connection reset"));
        }
        self.staged
            .lock()
            .unwrap()
            .insert((upload_url.to_string(), block_id.to_string()), data);
        Ok(())
    }

    async fn commit_block_list(
        &self,
        upload_url: &str,
        block_ids: &[String],
    ) -> Result<(), BackendError> {
        if self.hold_commit.load(Ordering::SeqCst) {
            self.commit_entered.notify_one();
            self.commit_release.notified().await;
        }
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("commit block list", "connection reset"));
        }
        let staged = self.staged.lock().unwrap();
        let mut blob = Vec::new();
        for id in block_ids {
            let data = staged
                .get(&(upload_url.to_string(), id.clone()))
                .ok_or_else(|| BackendError::rejected("commit block list", "unknown block"))?;
            blob.extend_from_slice(data);
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(upload_url.to_string(), blob);
        self.commits
            .lock()
            .unwrap()
            .push((upload_url.to_string(), block_ids.to_vec()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub cache: Arc<FakeCacheService>,
    pub blobs: Arc<FakeBlobStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let cache = Arc::new(FakeCacheService::default());
        let blobs = Arc::new(FakeBlobStore::default());
        let state = Arc::new(AppState::with_backends(
            test_config(),
            cache.clone(),
            blobs.clone(),
        ));
        TestApp {
            router: create_router(state.clone()),
            state,
            cache,
            blobs,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn lookup(&self, keys: &str, version: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(format!(
                "/_apis/artifactcache/cache?keys={keys}&version={version}"
            ))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn reserve(&self, key: &str, version: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/_apis/artifactcache/caches")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({ "key": key, "version": version }).to_string(),
            ))
            .unwrap();
        self.send(request).await
    }

    /// Reserves `key` and returns the cache id, asserting success.
    pub async fn reserve_ok(&self, key: &str, version: &str) -> u64 {
        let (status, body) = self.reserve(key, version).await;
        assert_eq!(status, StatusCode::OK, "reserve failed: {body}");
        body["cacheID"].as_u64().unwrap()
    }

    pub async fn upload(&self, cache_id: u64, range: &str, data: &[u8]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("PATCH")
            .uri(format!("/_apis/artifactcache/caches/{cache_id}"))
            .header("Content-Type", "application/octet-stream")
            .header("Content-Range", range)
            .body(Body::from(data.to_vec()))
            .unwrap();
        self.send(request).await
    }

    pub async fn commit(&self, cache_id: impl std::fmt::Display, size: u64) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/_apis/artifactcache/caches/{cache_id}"))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({ "size": size }).to_string()))
            .unwrap();
        self.send(request).await
    }
}

pub fn test_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
