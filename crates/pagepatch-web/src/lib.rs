//! Pagepatch Web - JSON API for page-level PDF editing.
//!
//! Routes are exported through [`build_router`] so the binary and the
//! integration tests share the exact same application.

pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use pagepatch_core::MAX_UPLOAD_BYTES;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the API router with all middleware attached.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/upload", post(routes::upload_pdf))
        .route("/api/page/{document_id}/{page_number}", get(routes::get_page))
        .route("/api/save/{document_id}", post(routes::save_page))
        .route("/api/finalize/{document_id}", post(routes::finalize_document))
        .route("/api/merge", post(routes::merge_pdfs))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
