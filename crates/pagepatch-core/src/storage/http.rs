//! HTTP blob store for Supabase-style storage services.
//!
//! Object endpoints follow the `storage/v1` layout:
//! `POST/GET/DELETE {endpoint}/storage/v1/object/{bucket}/{key}`, with the
//! service key as a bearer token. Public URLs use the
//! `storage/v1/object/public/...` form.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error};

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use super::BlobStore;

/// Request timeout for blob transfers.
///
/// Documents are capped at 16 MiB, so a transfer that takes longer than
/// this is stuck, not slow. No retry layer sits above this; a failure
/// surfaces directly to the caller.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Blob store backed by a Supabase-style storage REST API.
pub struct HttpBlobStore {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    bucket: String,
}

impl HttpBlobStore {
    /// Create a store from configuration.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::StorageRequest(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            bucket: config.bucket.clone(),
        })
    }

    /// Percent-encode a key, preserving its `/` separators.
    fn encode_key(key: &str) -> String {
        key.split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.endpoint,
            self.bucket,
            Self::encode_key(key)
        )
    }

    /// Public (unauthenticated) URL for a stored blob.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.endpoint,
            self.bucket,
            Self::encode_key(key)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let url = self.object_url(key);
        debug!("Uploading {} bytes to {}", bytes.len(), key);

        let response = self
            .authorize(self.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| Error::StorageRequest(format!("Upload of {key} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Upload of {} rejected with {}: {}", key, status, detail);
            return Err(Error::StorageStatus {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(self.public_url(key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.object_url(key);
        debug!("Downloading {}", key);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::StorageRequest(format!("Download of {key} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::BlobNotFound(key.to_string()));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::StorageStatus {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::StorageRequest(format!("Download of {key} failed: {e}")))?
            .to_vec();

        // Integrity check at the boundary: a PDF key must hold a PDF
        if key.ends_with(".pdf") && !super::is_valid_pdf(&bytes) {
            return Err(Error::NotPdf);
        }

        Ok(bytes)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let url = self.object_url(key);
        debug!("Deleting {}", key);

        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| Error::StorageRequest(format!("Delete of {key} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::StorageStatus {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(())
    }
}
