//! Blob store: key-addressed storage for opaque document bytes.
//!
//! The store is an external collaborator, injected as `Arc<dyn BlobStore>`
//! wherever documents are read or written — never reached through a global
//! handle. [`HttpBlobStore`] talks to a Supabase-style storage REST API;
//! [`MemoryBlobStore`] backs tests and offline use.

mod http;
mod memory;

pub use http::HttpBlobStore;
pub use memory::MemoryBlobStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StorageConfig;
use crate::error::Result;

/// Key-value store for opaque byte content.
///
/// Keys are opaque text under a fixed namespace; they carry no structural
/// meaning beyond uniqueness.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a key. Returns the blob's public URL.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Fetch the bytes stored under a key.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove a blob.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Create a blob store from configuration.
pub fn create_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    let store = HttpBlobStore::new(config)?;
    Ok(Arc::new(store))
}

/// Boundary integrity check: does this content carry a PDF signature?
pub fn is_valid_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

/// Build a storage key for a document.
///
/// `{prefix}/{stem}_{fingerprint12}.pdf` — the content fingerprint keeps
/// keys unique per upload without leaking anything about the caller.
pub fn make_key(prefix: &str, filename: &str, fingerprint: &str) -> String {
    let safe = crate::util::sanitize_filename(filename);
    let stem = crate::util::file_stem(&safe);
    let short = &fingerprint[..fingerprint.len().min(12)];
    format!("{prefix}/{stem}_{short}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_pdf() {
        assert!(is_valid_pdf(b"%PDF-1.5 rest of file"));
        assert!(!is_valid_pdf(b"<html>not a pdf</html>"));
        assert!(!is_valid_pdf(b""));
    }

    #[test]
    fn test_make_key() {
        let key = make_key("uploaded", "my report.pdf", "0123456789abcdef");
        assert_eq!(key, "uploaded/myreport_0123456789ab.pdf");
    }

    #[test]
    fn test_make_key_short_fingerprint() {
        let key = make_key("uploaded", "a.pdf", "abc");
        assert_eq!(key, "uploaded/a_abc.pdf");
    }
}
