use std::path::Path;
use std::sync::Arc;

use mupdf::Document as MuDocument;

use crate::error::{Error, Result};
use super::page_index::PageIndex;

/// Intrinsic page geometry in PDF points.
///
/// Fixed for the life of a document; every replacement page is rendered at
/// exactly this size, never at display resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    /// Height-over-width ratio used to derive display heights.
    pub fn aspect_ratio(self) -> f32 {
        self.height / self.width
    }
}

/// Thread-safe wrapper around a PDF document
pub struct PdfDocument {
    /// The raw PDF bytes (kept for re-processing and re-upload)
    bytes: Arc<Vec<u8>>,
    /// Intrinsic geometry of every page, captured once on load
    geometries: Arc<Vec<PageGeometry>>,
    /// Content fingerprint (MD5 hex), computed once on load
    fingerprint: String,
}

impl PdfDocument {
    /// Open a PDF from bytes.
    ///
    /// Rejects content without a `%PDF` signature before handing it to the
    /// parser, and captures the page count and per-page geometry up front.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        if !crate::storage::is_valid_pdf(&bytes) {
            return Err(Error::NotPdf);
        }

        let doc = MuDocument::from_bytes(&bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| Error::PdfOpen(format!("Failed to get page count: {e}")))?;
        let page_count = usize::try_from(page_count).unwrap_or(0);

        let mut geometries = Vec::with_capacity(page_count);
        for page_num in 0..page_count {
            let page_index = PageIndex::try_from_page_num(page_num, page_count)?;
            let page = doc.load_page(page_index.into()).map_err(|e| {
                Error::PdfOpen(format!("Failed to load page {page_num}: {e}"))
            })?;
            let bounds = page.bounds().map_err(|e| {
                Error::PdfOpen(format!("Failed to get bounds of page {page_num}: {e}"))
            })?;
            geometries.push(PageGeometry {
                width: bounds.x1 - bounds.x0,
                height: bounds.y1 - bounds.y0,
            });
        }

        let fingerprint = format!("{:x}", md5::compute(&bytes));

        Ok(Self {
            bytes: Arc::new(bytes),
            geometries: Arc::new(geometries),
            fingerprint,
        })
    }

    /// Open a PDF from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            Error::PdfOpen(format!(
                "Failed to read file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_bytes(bytes)
    }

    /// Get number of pages
    pub fn page_count(&self) -> usize {
        self.geometries.len()
    }

    /// Intrinsic geometry of a page, by 0-based index.
    pub fn page_geometry(&self, page_num: usize) -> Result<PageGeometry> {
        self.geometries
            .get(page_num)
            .copied()
            .ok_or(Error::PdfInvalidPage {
                page: page_num,
                total: self.page_count(),
            })
    }

    /// Get raw PDF bytes as a slice.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get raw PDF bytes as a reference-counted pointer.
    ///
    /// Use this when you need to share the bytes across threads or store
    /// them without copying. O(1), only increments the reference count.
    pub fn bytes_arc(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.bytes)
    }

    /// Open the document for operations (creates a temporary handle)
    pub(crate) fn open_document(&self) -> Result<MuDocument> {
        MuDocument::from_bytes(&self.bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to open document: {e}")))
    }

    /// Content-derived fingerprint.
    ///
    /// MD5 hash of the PDF bytes, computed once on load. Used to build
    /// unique storage keys for uploaded documents.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Clone for PdfDocument {
    /// Clone the document efficiently.
    ///
    /// O(1) - clones the `Arc` pointers to the underlying bytes and
    /// geometry table, not the data itself.
    fn clone(&self) -> Self {
        Self {
            bytes: Arc::clone(&self.bytes),
            geometries: Arc::clone(&self.geometries),
            fingerprint: self.fingerprint.clone(),
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count())
            .field("fingerprint", &self.fingerprint)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}
