//! Error types for the pagepatch API

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad input: missing file, wrong extension, out-of-range page,
    /// malformed payload. Reported to the caller, never retried.
    #[error("{0}")]
    Validation(String),

    /// Unknown document/session id.
    #[error("{0}")]
    NotFound(String),

    /// Blob store unreachable or rejecting requests.
    #[error("storage error: {0}")]
    Storage(String),

    /// PDF processing failure (corrupt content, assembly error).
    #[error("{0}")]
    Pdf(pagepatch_core::Error),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<pagepatch_core::Error> for ApiError {
    fn from(err: pagepatch_core::Error) -> Self {
        use pagepatch_core::Error as Core;
        match err {
            Core::PdfInvalidPage { .. } | Core::InvalidImage(_) | Core::NotPdf => {
                Self::Validation(err.to_string())
            }
            Core::StorageRequest(_) | Core::StorageStatus { .. } | Core::BlobNotFound(_) => {
                Self::Storage(err.to_string())
            }
            other => Self::Pdf(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            Self::Pdf(e) => {
                tracing::error!("PDF error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
