//! PDF document handling: loading, rasterization, replacement pages, and
//! reconstruction.

pub mod document;
pub mod page_index;
pub mod reconstruct;
pub mod render;
pub mod replacement;

pub use document::{PageGeometry, PdfDocument};
pub use page_index::PageIndex;
pub use reconstruct::{merge_documents, reconstruct};
pub use render::{PageRenderer, RenderedPage, render_page};
pub use replacement::{ReplacementStore, build_replacement_page};
