//! Finalize route - reconstructs the edited document and stores it.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use pagepatch_core::{make_key, reconstruct};
use tracing::info;
use uuid::Uuid;

use super::StoredDocumentResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Produce the edited output document.
///
/// Walks the original's pages, substituting stored replacements
/// positionally, uploads the result, and clears this document's
/// replacement entries. With no saved edits the output is a rebuilt copy
/// of the original.
pub async fn finalize_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<StoredDocumentResponse>> {
    let session = state
        .get_session(&document_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let (document, filename) = session
        .with_session(|s| (s.document.clone(), s.original_filename.clone()))
        .await
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let replaced = state.replacements.replaced_count(&document_id);
    info!(
        "Finalizing {} ({} pages, {} replaced)",
        document_id,
        document.page_count(),
        replaced
    );

    let state_for_task = Arc::clone(&state);
    let task_document_id = document_id.clone();
    let original = document.bytes_arc();
    let output = tokio::task::spawn_blocking(move || {
        let replacements = state_for_task.replacements.get_all(&task_document_id)?;
        reconstruct(&original, &replacements)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Reconstruction task panicked: {e}")))??;

    let stem = pagepatch_core::util::file_stem(&pagepatch_core::util::sanitize_filename(&filename));
    let key = make_key(
        &state.config.storage.key_prefix,
        &format!("edited_{stem}.pdf"),
        Uuid::new_v4().simple().to_string().as_str(),
    );
    let public_url = state
        .blob_store
        .put(&key, &output, "application/pdf")
        .await?;

    // Only a stored output consumes the session's edits
    state.replacements.clear(&document_id);

    info!("Finalized {} -> {}", document_id, key);

    Ok(Json(StoredDocumentResponse {
        success: true,
        file_path: key,
        public_url,
    }))
}
