//! Block blob REST adapter. Every call is addressed by the signed upload URL it
//! is given; nothing about a particular blob is kept between calls.

use super::check_status;
use crate::backend::{BackendError, BlobStore};
use axum::body::Bytes;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand::RngCore;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;

const MS_VERSION_HEADER: &str = "x-ms-version";
const MS_VERSION: &str = "2023-11-03";
const BLOCK_ID_LEN: usize = 64;

/// Returns a fresh random block id. Ids for a blob must all have the same
/// encoded length, which a fixed raw length guarantees.
pub fn new_block_id() -> String {
    let mut raw = [0u8; BLOCK_ID_LEN];
    rand::rng().fill_bytes(&mut raw);
    B64.encode(raw)
}

fn operation_url(
    operation: &'static str,
    upload_url: &str,
    params: &[(&str, &str)],
) -> Result<Url, BackendError> {
    let mut url = Url::parse(upload_url)
        .map_err(|e| BackendError::rejected(operation, format!("invalid upload URL: {e}")))?;
    {
        let mut query = url.query_pairs_mut();
        for (name, value) in params {
            query.append_pair(name, value);
        }
    }
    Ok(url)
}

fn block_list_xml(block_ids: &[String]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?><BlockList>"#);
    for id in block_ids {
        xml.push_str("<Latest>");
        xml.push_str(id);
        xml.push_str("</Latest>");
    }
    xml.push_str("</BlockList>");
    xml
}

pub struct BlockBlobStore {
    client: reqwest::Client,
}

impl BlockBlobStore {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("actions-cache-shim/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        BlockBlobStore { client }
    }
}

#[async_trait::async_trait]
impl BlobStore for BlockBlobStore {
    async fn stage_block(
        &self,
        upload_url: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<(), BackendError> {
        let operation = "stage block";
        let url = operation_url(
            operation,
            upload_url,
            &[("comp", "block"), ("blockid", block_id)],
        )?;

        tracing::debug!(size = data.len(), "staging block");
        let response = self
            .client
            .put(url)
            .header(MS_VERSION_HEADER, MS_VERSION)
            .body(data)
            .send()
            .await
            .map_err(|e| BackendError::unavailable(operation, e))?;
        check_status(operation, response).await?;
        Ok(())
    }

    async fn commit_block_list(
        &self,
        upload_url: &str,
        block_ids: &[String],
    ) -> Result<(), BackendError> {
        let operation = "commit block list";
        let url = operation_url(operation, upload_url, &[("comp", "blocklist")])?;

        tracing::debug!(blocks = block_ids.len(), "committing block list");
        let response = self
            .client
            .put(url)
            .header(MS_VERSION_HEADER, MS_VERSION)
            .header(CONTENT_TYPE, "application/xml")
            .body(block_list_xml(block_ids))
            .send()
            .await
            .map_err(|e| BackendError::unavailable(operation, e))?;
        check_status(operation, response).await?;
        Ok(())
    }
}
