//! HTTP object store gateway.
//!
//! Uploads to an object-storage REST API of the form
//! `POST {base_url}/object/{bucket}/{key}` with a bearer token, which is
//! what hosted storage services (Supabase Storage and similar) expose.
//! The returned locator is `{bucket}/{key}`.

use async_trait::async_trait;
use ragdesk_core::error::StorageError;
use ragdesk_core::storage::StorageGateway;
use std::time::Duration;
use tracing::{debug, warn};

use crate::key::blob_key;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub struct HttpObjectStorage {
    base_url: String,
    bucket: String,
    api_key: Option<String>,
    cache_control_secs: u64,
    client: reqwest::Client,
}

impl HttpObjectStorage {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into().trim_matches('/').to_string(),
            api_key,
            cache_control_secs: 3600,
            client,
        }
    }

    /// Set the `Cache-Control: max-age` sent with each upload.
    pub fn with_cache_control_secs(mut self, secs: u64) -> Self {
        self.cache_control_secs = secs;
        self
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, key)
    }
}

#[async_trait]
impl StorageGateway for HttpObjectStorage {
    fn name(&self) -> &str {
        "http"
    }

    async fn put(
        &self,
        bytes: &[u8],
        suggested_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = blob_key(suggested_name);
        let url = self.object_url(&key);
        let content_type = match content_type.trim() {
            "" => FALLBACK_CONTENT_TYPE,
            declared => declared,
        };

        debug!(url = %url, content_type, size_bytes = bytes.len(), "Uploading blob");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", content_type)
            .header("Cache-Control", format!("max-age={}", self.cache_control_secs))
            .header("x-upsert", "false")
            .body(bytes.to_vec());

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Object store rejected upload");
            return Err(StorageError::Rejected {
                status_code: status,
                message: body,
            });
        }

        Ok(format!("{}/{}", self.bucket, key))
    }
}
