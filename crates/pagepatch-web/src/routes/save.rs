//! Save route - stores an edited page into the replacement store.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use pagepatch_core::PageIndex;
use tracing::info;

use super::{SavePageRequest, SavePageResponse, decode_image_payload};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Store an edited page image as this document's replacement for that page.
///
/// The image is resampled to the page's intrinsic geometry before storage;
/// saving the same page twice overwrites the earlier edit.
pub async fn save_page(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    Json(request): Json<SavePageRequest>,
) -> ApiResult<Json<SavePageResponse>> {
    let session = state
        .get_session(&document_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let document = session
        .with_session(|s| s.document.clone())
        .await
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let page_index = PageIndex::from_page_number(request.page_number, document.page_count())?;
    let geometry = document.page_geometry(page_index.as_usize())?;
    let image_bytes = decode_image_payload(&request.image_data)?;

    // Decode + resample + re-encode is CPU work; keep it off the runtime
    let state_for_task = Arc::clone(&state);
    let task_document_id = document_id.clone();
    tokio::task::spawn_blocking(move || {
        state_for_task.replacements.put(
            &task_document_id,
            page_index.as_usize(),
            &image_bytes,
            geometry,
        )
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Save task panicked: {e}")))??;

    info!(
        "Stored replacement for page {} of {}",
        request.page_number, document_id
    );

    Ok(Json(SavePageResponse { success: true }))
}
