use thiserror::Error;

/// Unified error type for pagepatch-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - PDF operations (opening, reading, rendering, assembling, saving)
/// - Image operations (decoding edited page uploads)
/// - Blob storage operations (upload, download, delete)
/// - Configuration operations (loading, validation)
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    PdfInvalidPage { page: usize, total: usize },

    /// Failed to render a PDF page
    #[error("failed to render page {page}: {reason}")]
    PdfRender { page: usize, reason: String },

    /// Failed to assemble pages into an output document
    #[error("failed to assemble document: {0}")]
    PageAssembly(String),

    /// Failed to save a PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    // ==========================================================================
    // Image Errors
    // ==========================================================================
    /// Edited page image could not be decoded
    #[error("invalid image data: {0}")]
    InvalidImage(String),

    // ==========================================================================
    // Storage Errors
    // ==========================================================================
    /// Content does not carry a PDF signature
    #[error("content is not a valid PDF")]
    NotPdf,

    /// Blob store request failed at the transport level
    #[error("storage request failed: {0}")]
    StorageRequest(String),

    /// Blob store rejected a request
    #[error("storage returned status {status}: {detail}")]
    StorageStatus { status: u16, detail: String },

    /// Requested blob does not exist
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
