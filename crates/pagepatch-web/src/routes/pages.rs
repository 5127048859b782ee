//! Page route - rendered page images for the editor.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use pagepatch_core::{PageIndex, PageRenderer};
use tracing::debug;

use super::PageResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Get a rendered page image.
///
/// `page_number` is 1-based; it is converted to a 0-based index here and
/// nowhere else on this path.
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path((document_id, page_number)): Path<(String, usize)>,
) -> ApiResult<Json<PageResponse>> {
    let session = state
        .get_session(&document_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let document = session
        .with_session(|s| s.document.clone())
        .await
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let page_index = PageIndex::from_page_number(page_number, document.page_count())?;

    // Remember where the user is, so a reload can restore the view
    session
        .with_session_mut(|s| s.current_page = page_index.as_usize())
        .await;

    debug!(
        "Rendering page {}/{} of {}",
        page_number,
        document.page_count(),
        document_id
    );

    let render_config = state.config.render;
    let rendered = tokio::task::spawn_blocking(move || {
        PageRenderer::new(&document, render_config).render_page_png(page_index.as_usize())
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Render task panicked: {e}")))??;

    Ok(Json(PageResponse {
        success: true,
        image_data: BASE64.encode(&rendered.png),
        width: rendered.width,
        height: rendered.height,
    }))
}
