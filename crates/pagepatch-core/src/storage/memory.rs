//! In-memory blob store for tests and offline use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use super::BlobStore;

/// Blob store that keeps everything in a process-local map.
///
/// Returns `memory://` URLs; nothing is ever persisted.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a blob exists under the key.
    pub async fn contains(&self, key: &str) -> bool {
        self.blobs.read().await.contains_key(key)
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String> {
        self.blobs
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(format!("memory://{key}"))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::BlobNotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete_roundtrip() {
        let store = MemoryBlobStore::new();

        let url = store.put("ns/a.pdf", b"%PDF-data", "application/pdf").await.unwrap();
        assert_eq!(url, "memory://ns/a.pdf");
        assert_eq!(store.get("ns/a.pdf").await.unwrap(), b"%PDF-data");

        store.delete("ns/a.pdf").await.unwrap();
        assert!(matches!(
            store.get("ns/a.pdf").await,
            Err(Error::BlobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let store = MemoryBlobStore::new();
        assert!(matches!(
            store.get("nowhere").await,
            Err(Error::BlobNotFound(_))
        ));
    }
}
