//! Replacement pages: user-edited raster images wrapped as single-page PDFs.
//!
//! When a user saves an edited page, the uploaded image is decoded, forced
//! to the original page's intrinsic geometry, and embedded as the sole
//! content of a one-page PDF. Stretching to the exact target size is the
//! defined policy: the output canvas always equals the original page size,
//! whatever the edited image's own aspect ratio.
//!
//! [`ReplacementStore`] holds these artifacts for the duration of an edit
//! session, keyed by (document id, page index). It is disk-backed in a
//! temp directory that is removed when the store is dropped, so a crashed
//! or abandoned session never leaves artifacts behind.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use image::imageops;
use lopdf::{Dictionary, Document, Object, Stream};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{Error, Result};
use super::document::PageGeometry;

/// JPEG quality for embedded replacement images.
const JPEG_QUALITY: u8 = 95;

/// Build a single-page PDF from an edited raster image.
///
/// The image is resized (stretched, not cropped) to the page's intrinsic
/// width/height and embedded as a DCT-encoded image XObject covering the
/// whole page.
pub fn build_replacement_page(image_bytes: &[u8], geometry: PageGeometry) -> Result<Vec<u8>> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| Error::InvalidImage(format!("Failed to decode image: {e}")))?;
    let rgb = img.to_rgb8();

    // One pixel per point: the page is image-only, so its resolution is
    // whatever we rasterize here
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let px_width = geometry.width.round().max(1.0) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let px_height = geometry.height.round().max(1.0) as u32;

    let resized = if rgb.dimensions() == (px_width, px_height) {
        rgb
    } else {
        imageops::resize(&rgb, px_width, px_height, imageops::FilterType::Lanczos3)
    };

    let mut jpeg = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder
        .encode(
            resized.as_raw(),
            px_width,
            px_height,
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| Error::InvalidImage(format!("Failed to encode page image: {e}")))?;

    encode_image_page(&jpeg, px_width, px_height, geometry)
}

/// Wrap JPEG bytes as a one-page PDF at the given page geometry.
fn encode_image_page(
    jpeg: &[u8],
    px_width: u32,
    px_height: u32,
    geometry: PageGeometry,
) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut image_dict = Dictionary::new();
    image_dict.set("Type", Object::Name(b"XObject".to_vec()));
    image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
    image_dict.set("Width", Object::Integer(i64::from(px_width)));
    image_dict.set("Height", Object::Integer(i64::from(px_height)));
    image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    image_dict.set("BitsPerComponent", Object::Integer(8));
    image_dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    let image_id = doc.add_object(Stream::new(image_dict, jpeg.to_vec()));

    let resources_id = doc.add_object(Dictionary::from_iter([(
        "XObject",
        Object::Dictionary(Dictionary::from_iter([(
            "Im0",
            Object::Reference(image_id),
        )])),
    )]));

    // Scale the unit image square to the full page
    let content = format!(
        "q {} 0 0 {} 0 0 cm /Im0 Do Q",
        geometry.width, geometry.height
    );
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Reference(resources_id)),
        (
            "MediaBox",
            Object::Array(vec![
                0.into(),
                0.into(),
                Object::Real(geometry.width),
                Object::Real(geometry.height),
            ]),
        ),
    ]));

    let pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ("Count", Object::Integer(1)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| Error::PdfSave(format!("Failed to save replacement page: {e}")))?;

    Ok(output)
}

/// Disk-backed store of replacement pages, scoped to one edit session each.
///
/// Artifacts live under `<tempdir>/<document_id>/page_<index>.pdf`; the
/// temp directory is removed when the store is dropped. Writes to the same
/// (document, index) are last-write-wins; entries for different documents
/// never interact.
pub struct ReplacementStore {
    /// Temp directory - auto-cleaned on drop
    dir: TempDir,
    /// Replaced page indices per document
    index: Mutex<HashMap<String, BTreeSet<usize>>>,
}

impl ReplacementStore {
    /// Create a store with a fresh temp directory.
    pub fn new() -> std::io::Result<Self> {
        let dir = TempDir::new()?;
        debug!("Created replacement store at {}", dir.path().display());
        Ok(Self {
            dir,
            index: Mutex::new(HashMap::new()),
        })
    }

    fn page_path(&self, document_id: &str, page_index: usize) -> PathBuf {
        self.dir
            .path()
            .join(document_id)
            .join(format!("page_{page_index}.pdf"))
    }

    /// Build and store a replacement page for (document, index).
    ///
    /// The image is forced to `geometry`; a mismatched aspect ratio is
    /// resolved by stretching, never an error.
    pub fn put(
        &self,
        document_id: &str,
        page_index: usize,
        image_bytes: &[u8],
        geometry: PageGeometry,
    ) -> Result<()> {
        let artifact = build_replacement_page(image_bytes, geometry)?;

        let path = self.page_path(document_id, page_index);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &artifact)?;

        #[allow(clippy::unwrap_used)] // lock poisoning is unrecoverable here
        self.index
            .lock()
            .unwrap()
            .entry(document_id.to_string())
            .or_default()
            .insert(page_index);

        debug!(
            "Stored replacement for {} page {} ({} bytes)",
            document_id,
            page_index,
            artifact.len()
        );
        Ok(())
    }

    /// All stored replacements for a document, keyed by 0-based page index.
    pub fn get_all(&self, document_id: &str) -> Result<BTreeMap<usize, Vec<u8>>> {
        let indices = {
            #[allow(clippy::unwrap_used)]
            let index = self.index.lock().unwrap();
            index.get(document_id).cloned().unwrap_or_default()
        };

        let mut replacements = BTreeMap::new();
        for page_index in indices {
            let bytes = std::fs::read(self.page_path(document_id, page_index))?;
            replacements.insert(page_index, bytes);
        }
        Ok(replacements)
    }

    /// Whether a replacement exists for (document, index).
    pub fn has_page(&self, document_id: &str, page_index: usize) -> bool {
        #[allow(clippy::unwrap_used)]
        let index = self.index.lock().unwrap();
        index
            .get(document_id)
            .is_some_and(|pages| pages.contains(&page_index))
    }

    /// Number of replaced pages for a document.
    pub fn replaced_count(&self, document_id: &str) -> usize {
        #[allow(clippy::unwrap_used)]
        let index = self.index.lock().unwrap();
        index.get(document_id).map_or(0, BTreeSet::len)
    }

    /// Discard all replacements for a document.
    ///
    /// Called after a successful reconstruction and when a session expires.
    pub fn clear(&self, document_id: &str) {
        let removed = {
            #[allow(clippy::unwrap_used)]
            let mut index = self.index.lock().unwrap();
            index.remove(document_id)
        };

        if removed.is_some() {
            let _ = std::fs::remove_dir_all(self.dir.path().join(document_id));
            debug!("Cleared replacements for {}", document_id);
        }
    }
}
