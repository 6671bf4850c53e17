//! Filesystem gateway — blobs written as files under a root directory.
//!
//! Storage location: `~/.ragdesk/blobs/<unix-millis>-<name>` by default.
//! The locator is the absolute path of the written file.

use async_trait::async_trait;
use ragdesk_core::error::StorageError;
use ragdesk_core::storage::StorageGateway;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::key::blob_key;

/// Attempts at finding a free file name before giving up.
const MAX_NAME_ATTEMPTS: u32 = 16;

pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    /// Create a gateway rooted at `root`. The directory is created on first write.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl StorageGateway for FileSystemStorage {
    fn name(&self) -> &str {
        "filesystem"
    }

    /// Plain files carry no metadata, so `content_type` is only logged.
    async fn put(
        &self,
        bytes: &[u8],
        suggested_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            StorageError::Io(format!(
                "Failed to create storage directory {}: {e}",
                self.root.display()
            ))
        })?;

        let base = blob_key(suggested_name);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let key = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}-{attempt}")
            };
            let path = self.root.join(&key);

            // Never overwrite an existing blob
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            let mut file = match file {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::Io(format!(
                        "Failed to create {}: {e}",
                        path.display()
                    )));
                }
            };

            file.write_all(bytes)
                .await
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))?;
            file.flush()
                .await
                .map_err(|e| StorageError::Io(format!("Failed to flush {}: {e}", path.display())))?;

            debug!(
                path = %path.display(),
                content_type,
                size_bytes = bytes.len(),
                "Stored blob"
            );
            return Ok(path.to_string_lossy().into_owned());
        }

        Err(StorageError::Io(format!(
            "No free file name for '{suggested_name}' after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_blob_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path().join("blobs"));

        let locator = storage
            .put(b"col_a,col_b\n1,2\n", "data.csv", "text/csv")
            .await
            .unwrap();
        assert!(locator.ends_with("-data.csv"));
        assert!(locator.starts_with(dir.path().to_str().unwrap()));
        assert_eq!(std::fs::read(&locator).unwrap(), b"col_a,col_b\n1,2\n");
    }

    #[tokio::test]
    async fn does_not_overwrite_existing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path().to_path_buf());

        let first = storage.put(b"one", "same.txt", "text/plain").await.unwrap();
        let second = storage.put(b"two", "same.txt", "text/plain").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }

    #[tokio::test]
    async fn unwritable_root_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();

        let storage = FileSystemStorage::new(blocker.join("blobs"));
        let err = storage.put(b"data", "a.txt", "text/plain").await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
