//! In-memory gateway — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use ragdesk_core::error::StorageError;
use ragdesk_core::storage::StorageGateway;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::key::blob_key;

const SCHEME: &str = "memory://";

struct Blob {
    bytes: Vec<u8>,
    content_type: String,
}

/// A gateway that keeps blobs in a map. Nothing survives the process.
pub struct InMemoryStorage {
    blobs: Arc<RwLock<HashMap<String, Blob>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fetch the bytes behind a locator returned by `put`.
    pub async fn get(&self, locator: &str) -> Option<Vec<u8>> {
        let key = locator.strip_prefix(SCHEME)?;
        self.blobs.read().await.get(key).map(|b| b.bytes.clone())
    }

    /// The content type the blob was uploaded with.
    pub async fn content_type(&self, locator: &str) -> Option<String> {
        let key = locator.strip_prefix(SCHEME)?;
        self.blobs
            .read()
            .await
            .get(key)
            .map(|b| b.content_type.clone())
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageGateway for InMemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(
        &self,
        bytes: &[u8],
        suggested_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let base = blob_key(suggested_name);
        let mut blobs = self.blobs.write().await;

        let mut key = base.clone();
        let mut n = 1;
        while blobs.contains_key(&key) {
            key = format!("{base}-{n}");
            n += 1;
        }

        blobs.insert(
            key.clone(),
            Blob {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("{SCHEME}{key}"))
    }
}
