//! Merge route - concatenates uploaded PDFs into one stored document.

use std::sync::Arc;

use axum::{Json, extract::State};
use axum_extra::extract::Multipart;
use pagepatch_core::{is_valid_pdf, make_key, merge_documents};
use tracing::info;
use uuid::Uuid;

use super::StoredDocumentResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Merge uploaded PDFs in the order they appear in the request.
///
/// Plain sequential page concatenation; no per-page transforms.
pub async fn merge_pdfs(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<StoredDocumentResponse>> {
    let mut documents = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        if name != "files[]" && name != "files" {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if !filename.to_lowercase().ends_with(".pdf") {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read {filename}: {e}")))?;

        if !is_valid_pdf(&data) {
            return Err(ApiError::Validation(format!(
                "{filename} is not a valid PDF"
            )));
        }

        documents.push(data.to_vec());
    }

    if documents.is_empty() {
        return Err(ApiError::Validation("No files provided".to_string()));
    }

    let count = documents.len();
    let merged = tokio::task::spawn_blocking(move || merge_documents(&documents))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Merge task panicked: {e}")))??;

    let key = make_key(
        &state.config.storage.key_prefix,
        "merged.pdf",
        Uuid::new_v4().simple().to_string().as_str(),
    );
    let public_url = state
        .blob_store
        .put(&key, &merged, "application/pdf")
        .await?;

    info!("Merged {} documents -> {}", count, key);

    Ok(Json(StoredDocumentResponse {
        success: true,
        file_path: key,
        public_url,
    }))
}
