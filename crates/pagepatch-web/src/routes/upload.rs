//! Upload route - PDF file upload handling.

use std::sync::Arc;

use axum::{Json, extract::State};
use axum_extra::extract::Multipart;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use pagepatch_core::{MAX_UPLOAD_BYTES, PageRenderer, PdfDocument, make_key};
use tracing::{error, info};

use super::UploadResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Upload a PDF file.
///
/// Stores the original in the blob store, creates an edit session, and
/// returns the session id together with a rendered preview of page 1.
pub async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" {
            continue;
        }

        let filename = field.file_name().unwrap_or("document.pdf").to_string();
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(ApiError::Validation("File must be a PDF".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read upload: {e}")))?;

        if data.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::Validation(format!(
                "File exceeds the {} MiB limit",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }

        // Parse and render the preview in a blocking task to avoid
        // stalling the async runtime
        let render_config = state.config.render;
        let data_vec = data.to_vec();
        let (document, preview) = tokio::task::spawn_blocking(move || {
            let document = PdfDocument::from_bytes(data_vec)?;
            let preview = PageRenderer::new(&document, render_config).render_page_png(0)?;
            Ok::<_, pagepatch_core::Error>((document, preview))
        })
        .await
        .map_err(|e| {
            error!("PDF parsing task panicked: {}", e);
            ApiError::Internal(anyhow::anyhow!("PDF parsing failed"))
        })??;

        let key = make_key(
            &state.config.storage.key_prefix,
            &filename,
            document.fingerprint(),
        );
        let content_type = mime_guess::from_path(&filename).first_or_octet_stream();
        let public_url = state
            .blob_store
            .put(&key, document.bytes(), content_type.as_ref())
            .await?;

        let total_pages = document.page_count();
        let document_id = state
            .create_session(
                document,
                filename.clone(),
                key.clone(),
                public_url.clone(),
            )
            .await;

        info!(
            "Created session {} for {} ({} pages)",
            document_id, filename, total_pages
        );

        return Ok(Json(UploadResponse {
            success: true,
            document_id,
            filename,
            file_path: key,
            public_url,
            total_pages,
            current_page: 1,
            image_data: BASE64.encode(&preview.png),
            width: preview.width,
            height: preview.height,
        }));
    }

    Err(ApiError::Validation("No file uploaded".to_string()))
}
