//! HTTP route handlers for the pagepatch API.
//!
//! All routes speak JSON; page images travel base64-encoded inside JSON
//! bodies (the editor client draws them onto a canvas and posts the edited
//! pixels back the same way). Page numbers are 1-based at this boundary
//! and converted to 0-based indices exactly once, at each handler's entry.

mod finalize;
mod merge;
mod pages;
mod save;
mod upload;

pub use finalize::finalize_document;
pub use merge::merge_pdfs;
pub use pages::get_page;
pub use save::save_page;
pub use upload::upload_pdf;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Response to a successful upload.
#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub document_id: String,
    pub filename: String,
    pub file_path: String,
    pub public_url: String,
    pub total_pages: usize,
    pub current_page: usize,
    /// Base64 PNG preview of page 1
    pub image_data: String,
    pub width: u32,
    pub height: u32,
}

/// Response carrying one rendered page.
#[derive(Serialize)]
pub struct PageResponse {
    pub success: bool,
    pub image_data: String,
    pub width: u32,
    pub height: u32,
}

/// Request to store an edited page.
#[derive(Deserialize)]
pub struct SavePageRequest {
    /// 1-based page number
    pub page_number: usize,
    /// Base64 (optionally data-URL) encoded raster image
    pub image_data: String,
}

#[derive(Serialize)]
pub struct SavePageResponse {
    pub success: bool,
}

/// Response for finalize and merge: a stored output document.
#[derive(Serialize)]
pub struct StoredDocumentResponse {
    pub success: bool,
    pub file_path: String,
    pub public_url: String,
}

/// Decode a base64 image payload, tolerating a `data:...;base64,` prefix.
pub(crate) fn decode_image_payload(data: &str) -> ApiResult<Vec<u8>> {
    let encoded = if data.starts_with("data:") {
        data.split_once(',')
            .map(|(_, rest)| rest)
            .ok_or_else(|| ApiError::Validation("Malformed data URL".to_string()))?
    } else {
        data
    };

    BASE64
        .decode(encoded.trim())
        .map_err(|e| ApiError::Validation(format!("Invalid base64 image data: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_base64() {
        let encoded = BASE64.encode(b"pixels");
        assert_eq!(decode_image_payload(&encoded).unwrap(), b"pixels");
    }

    #[test]
    fn test_decode_data_url() {
        let encoded = format!("data:image/png;base64,{}", BASE64.encode(b"pixels"));
        assert_eq!(decode_image_payload(&encoded).unwrap(), b"pixels");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_image_payload("!!not base64!!").is_err());
        assert!(decode_image_payload("data:image/png;base64").is_err());
    }
}
