//! Pagepatch Core Library
//!
//! This library provides the core functionality for page-level PDF editing:
//! - PDF loading and page rasterization (preview images for the editor)
//! - Replacement pages built from user-edited raster images
//! - Document reconstruction (positional page substitution) and merging
//! - Blob storage client for uploaded and produced documents
//!
//! The request handlers in `pagepatch-web` orchestrate these components per
//! user action; nothing here retries, queues, or caches.

pub mod config;
pub mod error;
pub mod pdf;
pub mod storage;
pub mod util;

pub use config::{AppConfig, MAX_UPLOAD_BYTES, RenderConfig, StorageConfig};
pub use error::{Error, Result};
pub use pdf::{
    PageGeometry, PageIndex, PageRenderer, PdfDocument, RenderedPage, ReplacementStore,
    build_replacement_page, merge_documents, reconstruct, render_page,
};
pub use storage::{BlobStore, HttpBlobStore, MemoryBlobStore, create_blob_store, is_valid_pdf, make_key};
