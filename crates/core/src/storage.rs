//! Storage gateway trait — the abstraction over the external blob store.
//!
//! The source adapter hands raw file bytes to a gateway and gets back a
//! stable locator. Retry, auth and durability belong to the gateway.
//!
//! Implementations: in-memory, local filesystem, HTTP object store.

use async_trait::async_trait;

use crate::error::StorageError;

#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g., "filesystem", "http").
    fn name(&self) -> &str;

    /// Persist `bytes` under a key derived from `suggested_name` and return
    /// the locator that retrieves them. `content_type` is the resolved MIME
    /// type; gateways that keep metadata store it with the blob.
    async fn put(
        &self,
        bytes: &[u8],
        suggested_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;
}
