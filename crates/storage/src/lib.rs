//! Storage gateway implementations for ragdesk.
//!
//! All gateways implement the `ragdesk_core::StorageGateway` trait.
//! `build_from_config` selects one based on configuration.

pub mod filesystem;
pub mod http;
pub mod in_memory;
pub mod key;

pub use filesystem::FileSystemStorage;
pub use http::HttpObjectStorage;
pub use in_memory::InMemoryStorage;
pub use key::blob_key;

use ragdesk_config::StorageConfig;
use ragdesk_core::StorageGateway;
use std::sync::Arc;

/// Build the configured storage gateway.
///
/// Assumes `config` passed `AppConfig::validate`; an `http` backend without a
/// base URL falls back to the filesystem.
pub fn build_from_config(config: &StorageConfig) -> Arc<dyn StorageGateway> {
    match (config.backend.as_str(), &config.base_url) {
        ("memory", _) => Arc::new(InMemoryStorage::new()),
        ("http", Some(base_url)) => Arc::new(
            HttpObjectStorage::new(base_url, &config.bucket, config.api_key.clone())
                .with_cache_control_secs(config.cache_control_secs),
        ),
        _ => Arc::new(FileSystemStorage::new(config.resolved_root_dir())),
    }
}
