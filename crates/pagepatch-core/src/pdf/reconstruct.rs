//! Document reconstruction and merging.
//!
//! Both operations assemble an output PDF from pages of one or more source
//! documents, as structure-preserving copies (object transplants, never
//! re-rasterization — unedited pages lose no quality):
//!
//! - [`reconstruct`] walks the original's pages in order and substitutes
//!   the stored replacement page wherever one exists.
//! - [`merge_documents`] concatenates whole documents back to back.
//!
//! Page-by-page assembly drags every source object along, including the
//! resources of pages that were replaced. The output is therefore pruned
//! of unreferenced objects, renumbered, and compressed before saving.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Assembles pages from several source documents into one output document.
///
/// Sources are loaded into a shared object-id space via renumbering; the
/// caller then picks pages (in any order, from any loaded source) and
/// finishes with a rebuilt page tree.
struct DocumentAssembler {
    /// Next free object id across all loaded sources
    max_id: u32,
    /// Non-structural objects from every loaded source
    objects: BTreeMap<ObjectId, Object>,
    /// Page dictionaries from every loaded source
    page_dicts: BTreeMap<ObjectId, Dictionary>,
    /// Output page order
    order: Vec<ObjectId>,
}

impl DocumentAssembler {
    fn new() -> Self {
        Self {
            max_id: 1,
            objects: BTreeMap::new(),
            page_dicts: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Load a source document into the assembler's id space.
    ///
    /// Returns the source's page object ids in page order. The source's
    /// own document structure (catalog, page tree, outlines) is discarded;
    /// the output gets a fresh one in [`Self::finish`].
    fn load(&mut self, bytes: &[u8], label: &str) -> Result<Vec<ObjectId>> {
        let mut doc = Document::load_mem(bytes)
            .map_err(|e| Error::PageAssembly(format!("Failed to load {label}: {e}")))?;

        doc.renumber_objects_with(self.max_id);
        self.max_id = doc.max_id + 1;

        let mut page_ids = Vec::new();
        for &page_id in doc.get_pages().values() {
            let dict = doc
                .get_object(page_id)
                .and_then(Object::as_dict)
                .map_err(|e| {
                    Error::PageAssembly(format!("Invalid page object in {label}: {e}"))
                })?
                .clone();
            self.page_dicts.insert(page_id, dict);
            page_ids.push(page_id);
        }

        if page_ids.is_empty() {
            return Err(Error::PageAssembly(format!("{label} has no pages")));
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    self.objects.insert(object_id, object);
                }
            }
        }

        Ok(page_ids)
    }

    /// Append a previously loaded page to the output order.
    fn push_page(&mut self, page_id: ObjectId) {
        self.order.push(page_id);
    }

    /// Build, clean up, and serialize the output document.
    fn finish(self) -> Result<Vec<u8>> {
        if self.order.is_empty() {
            return Err(Error::PageAssembly("No pages to assemble".to_string()));
        }

        let mut document = Document::with_version("1.5");
        // Keep fresh ids clear of every transplanted source id
        document.max_id = self.max_id;

        for (object_id, object) in self.objects {
            document.objects.insert(object_id, object);
        }

        let pages_id = document.new_object_id();

        for page_id in &self.order {
            let mut dict = self
                .page_dicts
                .get(page_id)
                .cloned()
                .ok_or_else(|| Error::PageAssembly(format!("Unknown page object {page_id:?}")))?;
            dict.set("Parent", Object::Reference(pages_id));
            document
                .objects
                .insert(*page_id, Object::Dictionary(dict));
        }

        let kids: Vec<Object> = self.order.iter().map(|&id| Object::Reference(id)).collect();

        #[allow(clippy::cast_possible_truncation)]
        let total_pages = self.order.len() as u32;

        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(i64::from(total_pages))),
        ]);
        document
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = document.new_object_id();
        let catalog_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        document
            .objects
            .insert(catalog_id, Object::Dictionary(catalog_dict));

        document.trailer.set("Root", Object::Reference(catalog_id));

        // Drop resources that belonged only to pages we did not keep,
        // then compact ids and compress streams
        let pruned = document.prune_objects();
        if !pruned.is_empty() {
            debug!("Pruned {} unreferenced objects", pruned.len());
        }

        #[allow(clippy::cast_possible_truncation)]
        let new_max_id = document.objects.len() as u32;
        document.max_id = new_max_id;

        document.renumber_objects();
        document.compress();

        let mut output = Vec::new();
        document
            .save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save assembled PDF: {e}")))?;

        Ok(output)
    }
}

/// Rebuild a document, substituting replacement pages positionally.
///
/// Output page `i` is `replacements[i]`'s single page when present, else
/// the original's page `i`; page order is never changed. Replacement
/// indices past the end of the document are ignored (they can only be
/// stale state from an earlier, larger document under the same id).
///
/// Fails atomically: any unreadable source page fails the whole operation
/// and no output is produced.
pub fn reconstruct(
    original: &[u8],
    replacements: &BTreeMap<usize, Vec<u8>>,
) -> Result<Vec<u8>> {
    let mut assembler = DocumentAssembler::new();

    let original_pages = assembler
        .load(original, "original document")
        .map_err(|e| match e {
            Error::PageAssembly(msg) => Error::PdfOpen(msg),
            other => other,
        })?;
    let total_pages = original_pages.len();

    let mut replacement_pages: BTreeMap<usize, ObjectId> = BTreeMap::new();
    for (&page_index, bytes) in replacements {
        if page_index >= total_pages {
            warn!(
                "Ignoring replacement for page index {} (document has {} pages)",
                page_index, total_pages
            );
            continue;
        }

        let pages = assembler.load(bytes, &format!("replacement for page {page_index}"))?;
        if pages.len() > 1 {
            debug!(
                "Replacement for page {} has {} pages; using the first",
                page_index,
                pages.len()
            );
        }
        replacement_pages.insert(page_index, pages[0]);
    }

    for (i, &original_page) in original_pages.iter().enumerate() {
        assembler.push_page(
            replacement_pages
                .get(&i)
                .copied()
                .unwrap_or(original_page),
        );
    }

    debug!(
        "Reconstructing {} pages ({} replaced)",
        total_pages,
        replacement_pages.len()
    );
    assembler.finish()
}

/// Concatenate whole documents in the given order.
pub fn merge_documents(documents: &[Vec<u8>]) -> Result<Vec<u8>> {
    if documents.is_empty() {
        return Err(Error::PageAssembly("No documents to merge".to_string()));
    }

    if documents.len() == 1 {
        return Ok(documents[0].clone());
    }

    let mut assembler = DocumentAssembler::new();
    for (i, bytes) in documents.iter().enumerate() {
        let pages = assembler.load(bytes, &format!("document {}", i + 1))?;
        for page_id in pages {
            assembler.push_page(page_id);
        }
    }

    assembler.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::Stream;

    /// Build a PDF whose pages carry the given text and (width, height).
    fn create_test_pdf(pages: &[(&str, (i64, i64))]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let page_tree_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ]));

        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(Dictionary::from_iter([(
                "F1",
                Object::Reference(font_id),
            )])),
        )]));

        let mut kids = Vec::new();
        for &(text, (width, height)) in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 100.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(page_tree_id)),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Reference(resources_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        0.into(),
                        0.into(),
                        width.into(),
                        height.into(),
                    ]),
                ),
            ]));
            kids.push(Object::Reference(page_id));
        }

        #[allow(clippy::cast_possible_wrap)]
        let count = kids.len() as i64;
        let page_tree = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ]);
        doc.objects.insert(page_tree_id, Object::Dictionary(page_tree));

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(page_tree_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// Numeric MediaBox entry as f32, whether written as Real or Integer.
    #[allow(clippy::cast_precision_loss)]
    fn dim(obj: &Object) -> f32 {
        obj.as_f32()
            .ok()
            .or_else(|| obj.as_i64().ok().map(|v| v as f32))
            .unwrap()
    }

    /// (width, height) of every page, in page order.
    fn media_boxes(bytes: &[u8]) -> Vec<(f32, f32)> {
        let doc = Document::load_mem(bytes).unwrap();
        let mut boxes = Vec::new();
        for &page_id in doc.get_pages().values() {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            boxes.push((dim(&media_box[2]), dim(&media_box[3])));
        }
        boxes
    }

    #[test]
    fn test_merge_empty_fails() {
        assert!(merge_documents(&[]).is_err());
    }

    #[test]
    fn test_merge_single_passes_through() {
        let pdf = create_test_pdf(&[("only", (612, 792))]);
        let merged = merge_documents(std::slice::from_ref(&pdf)).unwrap();
        assert_eq!(merged, pdf);
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let doc_a = create_test_pdf(&[("A1", (612, 792)), ("A2", (612, 792))]);
        let doc_b = create_test_pdf(&[("B1", (500, 700)), ("B2", (500, 700)), ("B3", (500, 700))]);

        let merged = merge_documents(&[doc_a, doc_b]).unwrap();
        let boxes = media_boxes(&merged);
        assert_eq!(
            boxes,
            vec![
                (612.0, 792.0),
                (612.0, 792.0),
                (500.0, 700.0),
                (500.0, 700.0),
                (500.0, 700.0),
            ]
        );
    }

    #[test]
    fn test_reconstruct_without_replacements_preserves_pages() {
        let original = create_test_pdf(&[
            ("one", (612, 792)),
            ("two", (500, 700)),
            ("three", (300, 300)),
        ]);

        let output = reconstruct(&original, &BTreeMap::new()).unwrap();
        assert_eq!(
            media_boxes(&output),
            vec![(612.0, 792.0), (500.0, 700.0), (300.0, 300.0)]
        );
    }

    #[test]
    fn test_reconstruct_substitutes_positionally() {
        let original = create_test_pdf(&[
            ("one", (612, 792)),
            ("two", (612, 792)),
            ("three", (612, 792)),
        ]);
        // Distinctive geometry marks the substituted page
        let replacement = create_test_pdf(&[("edited", (111, 222))]);

        let output =
            reconstruct(&original, &BTreeMap::from([(1, replacement)])).unwrap();
        assert_eq!(
            media_boxes(&output),
            vec![(612.0, 792.0), (111.0, 222.0), (612.0, 792.0)]
        );
    }

    #[test]
    fn test_reconstruct_ignores_stale_out_of_range_replacement() {
        let original = create_test_pdf(&[("one", (612, 792)), ("two", (612, 792))]);
        let replacement = create_test_pdf(&[("edited", (111, 222))]);

        let output =
            reconstruct(&original, &BTreeMap::from([(5, replacement)])).unwrap();
        assert_eq!(media_boxes(&output), vec![(612.0, 792.0), (612.0, 792.0)]);
    }

    #[test]
    fn test_reconstruct_is_structurally_stable() {
        let original = create_test_pdf(&[("one", (612, 792)), ("two", (500, 700))]);
        let replacement = create_test_pdf(&[("edited", (612, 792))]);
        let replacements = BTreeMap::from([(0, replacement)]);

        let first = reconstruct(&original, &replacements).unwrap();
        let second = reconstruct(&original, &replacements).unwrap();
        assert_eq!(media_boxes(&first), media_boxes(&second));
    }

    #[test]
    fn test_reconstruct_rejects_corrupt_original() {
        let result = reconstruct(b"not a pdf", &BTreeMap::new());
        assert!(matches!(result, Err(Error::PdfOpen(_))));
    }

    #[test]
    fn test_reconstruct_rejects_corrupt_replacement() {
        let original = create_test_pdf(&[("one", (612, 792))]);
        let result = reconstruct(
            &original,
            &BTreeMap::from([(0, b"garbage".to_vec())]),
        );
        assert!(matches!(result, Err(Error::PageAssembly(_))));
    }
}
