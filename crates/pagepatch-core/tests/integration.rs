//! Integration tests for pagepatch-core
//!
//! These tests verify the end-to-end edit workflow against documents built
//! in-code with lopdf:
//! - loading and rasterization geometry
//! - replacement-page construction from edited images
//! - reconstruction (substitution, ordering, cleanup)
//! - merging and blob-store round trips

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use pagepatch_core::{
    BlobStore, MemoryBlobStore, PageIndex, PageRenderer, PdfDocument, RenderConfig,
    ReplacementStore, is_valid_pdf, make_key, merge_documents, reconstruct,
};

// =============================================================================
// Test Fixtures
// =============================================================================

/// Build a PDF whose pages carry the given text and (width, height) in points.
fn build_pdf(pages: &[(&str, (i64, i64))]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::new();
    for &(text, (width, height)) in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![50.into(), 50.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), width.into(), height.into()]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap();
    let page_tree = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
    ]);
    doc.objects
        .insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// PNG bytes of a flat-colored image at the given size.
fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([40, 90, 200]));
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn render_config(target_width: u32) -> RenderConfig {
    RenderConfig {
        target_width,
        supersample: 2.0,
    }
}

// =============================================================================
// Rasterization geometry
// =============================================================================

#[test]
fn rasterized_page_has_derived_height() {
    let doc = PdfDocument::from_bytes(build_pdf(&[("letter", (612, 792))])).unwrap();
    let renderer = PageRenderer::new(&doc, render_config(300));

    let rendered = renderer.render_page_png(0).unwrap();
    assert_eq!(rendered.width, 300);
    // round(300 * 792 / 612) = 388
    assert!((i64::from(rendered.height) - 388).abs() <= 1);
}

#[test]
fn aspect_ratio_is_recomputed_per_page() {
    let doc = PdfDocument::from_bytes(build_pdf(&[
        ("portrait", (612, 792)),
        ("square", (400, 400)),
    ]))
    .unwrap();
    let renderer = PageRenderer::new(&doc, render_config(200));

    let portrait = renderer.render_page_png(0).unwrap();
    let square = renderer.render_page_png(1).unwrap();
    assert!((i64::from(portrait.height) - 259).abs() <= 1);
    assert_eq!(square.height, 200);
}

#[test]
fn rendering_past_the_last_page_fails() {
    let doc = PdfDocument::from_bytes(build_pdf(&[("one", (612, 792))])).unwrap();
    let renderer = PageRenderer::new(&doc, render_config(100));
    assert!(renderer.render_page_png(1).is_err());
}

// =============================================================================
// End-to-end edit workflow
// =============================================================================

#[test]
fn save_page_then_reconstruct_replaces_only_that_page() {
    let original_bytes = build_pdf(&[
        ("page one", (612, 792)),
        ("page two", (612, 792)),
        ("page three", (612, 792)),
    ]);
    let document = PdfDocument::from_bytes(original_bytes.clone()).unwrap();
    let store = ReplacementStore::new().unwrap();
    let document_id = "session-1";

    // User edits page 2 (1-based at the boundary); the edited image has a
    // very different aspect ratio than the page
    let page_index = PageIndex::from_page_number(2, document.page_count()).unwrap();
    let geometry = document.page_geometry(page_index.as_usize()).unwrap();
    store
        .put(document_id, page_index.as_usize(), &png_bytes(900, 300), geometry)
        .unwrap();

    let replacements = store.get_all(document_id).unwrap();
    let output = reconstruct(&original_bytes, &replacements).unwrap();
    store.clear(document_id);

    // Output must open under the renderer's parser as well as lopdf's
    let reconstructed = PdfDocument::from_bytes(output).unwrap();
    assert_eq!(reconstructed.page_count(), 3);

    // Every page keeps the original intrinsic geometry, including the
    // replaced one
    for page in 0..3 {
        let geometry = reconstructed.page_geometry(page).unwrap();
        assert!((geometry.width - 612.0).abs() < 0.5, "page {page} width");
        assert!((geometry.height - 792.0).abs() < 0.5, "page {page} height");
    }

    // The replaced page still rasterizes
    let renderer = PageRenderer::new(&reconstructed, render_config(150));
    let rendered = renderer.render_page_png(1).unwrap();
    assert_eq!(rendered.width, 150);
}

#[test]
fn reconstruct_without_edits_preserves_every_page() {
    let original = build_pdf(&[("a", (612, 792)), ("b", (500, 700))]);

    let output = reconstruct(&original, &BTreeMap::new()).unwrap();
    let reconstructed = PdfDocument::from_bytes(output).unwrap();

    assert_eq!(reconstructed.page_count(), 2);
    let second = reconstructed.page_geometry(1).unwrap();
    assert!((second.width - 500.0).abs() < 0.5);
    assert!((second.height - 700.0).abs() < 0.5);
}

#[test]
fn page_number_boundary_validation() {
    let doc = PdfDocument::from_bytes(build_pdf(&[
        ("a", (612, 792)),
        ("b", (612, 792)),
        ("c", (612, 792)),
    ]))
    .unwrap();

    assert!(PageIndex::from_page_number(0, doc.page_count()).is_err());
    assert!(PageIndex::from_page_number(4, doc.page_count()).is_err());
    let last = PageIndex::from_page_number(3, doc.page_count()).unwrap();
    assert_eq!(last.as_usize(), 2);
}

// =============================================================================
// Merge and storage round trips
// =============================================================================

#[test]
fn merge_keeps_sequential_page_order() {
    let doc_a = build_pdf(&[("A1", (612, 792)), ("A2", (612, 792))]);
    let doc_b = build_pdf(&[("B1", (500, 700)), ("B2", (500, 700)), ("B3", (500, 700))]);

    let merged = merge_documents(&[doc_a, doc_b]).unwrap();
    let merged_doc = PdfDocument::from_bytes(merged).unwrap();

    assert_eq!(merged_doc.page_count(), 5);
    // A pages first, then B pages - geometry marks the provenance
    for page in 0..2 {
        assert!((merged_doc.page_geometry(page).unwrap().width - 612.0).abs() < 0.5);
    }
    for page in 2..5 {
        assert!((merged_doc.page_geometry(page).unwrap().width - 500.0).abs() < 0.5);
    }
}

#[tokio::test]
async fn stored_documents_round_trip_through_blob_store() {
    let store = MemoryBlobStore::new();
    let bytes = build_pdf(&[("stored", (612, 792))]);
    let document = PdfDocument::from_bytes(bytes.clone()).unwrap();

    let key = make_key("uploaded", "stored.pdf", document.fingerprint());
    let url = store.put(&key, &bytes, "application/pdf").await.unwrap();
    assert!(url.contains(&key));

    let fetched = store.get(&key).await.unwrap();
    assert!(is_valid_pdf(&fetched));
    assert_eq!(fetched, bytes);
}
