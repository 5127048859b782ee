use image::{ImageEncoder, RgbImage, imageops};
use mupdf::{Colorspace, Matrix};

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use super::document::PdfDocument;
use super::page_index::PageIndex;

/// A page rendered to display resolution.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// PNG-encoded pixels
    pub png: Vec<u8>,
    /// Display width in pixels (always the configured target width)
    pub width: u32,
    /// Display height in pixels, derived from the page's aspect ratio
    pub height: u32,
}

/// Page renderer for PDF documents.
///
/// Renders at `supersample` times the page's natural resolution, then
/// downscales to the target display width with a Lanczos filter. Direct
/// rendering at display size aliases fine strokes; sampling down from a
/// larger pixmap does not.
pub struct PageRenderer<'a> {
    /// The PDF document to render
    pub doc: &'a PdfDocument,
    /// Rasterization settings
    pub config: RenderConfig,
}

impl<'a> PageRenderer<'a> {
    /// Create a renderer with the given settings
    pub const fn new(doc: &'a PdfDocument, config: RenderConfig) -> Self {
        Self { doc, config }
    }

    /// Display dimensions for a page at the configured target width.
    ///
    /// Width is the target width exactly; height is
    /// `round(target_width * page_height / page_width)`. The aspect ratio
    /// is taken from the page's intrinsic bounds, recomputed per page.
    pub fn display_size(&self, page_num: usize) -> Result<(u32, u32)> {
        let geometry = self.doc.page_geometry(page_num)?;
        let width = self.config.target_width;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let height = (width as f32 * geometry.aspect_ratio()).round().max(1.0) as u32;

        Ok((width, height))
    }

    /// Render a page to an RGB image at display resolution.
    pub fn render_page(&self, page_num: usize) -> Result<RgbImage> {
        let page_index = PageIndex::try_from_page_num(page_num, self.doc.page_count())?;
        let (target_width, target_height) = self.display_size(page_num)?;

        let doc = self.doc.open_document()?;
        let page = doc.load_page(page_index.into()).map_err(|e| Error::PdfRender {
            page: page_num,
            reason: format!("Failed to load page: {e}"),
        })?;

        // Supersampled pixmap; downscaled below
        let scale = self.config.supersample;
        let matrix = Matrix::new_scale(scale, scale);

        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
            .map_err(|e| Error::PdfRender {
                page: page_num,
                reason: format!("Failed to render: {e}"),
            })?;

        let pixels = pixmap.samples();
        let img_width = pixmap.width();
        let img_height = pixmap.height();

        let n = pixmap.n() as usize; // components per pixel
        let mut rgb_pixels = Vec::with_capacity((img_width * img_height * 3) as usize);

        for chunk in pixels.chunks(n) {
            match n {
                3 => {
                    rgb_pixels.extend_from_slice(chunk);
                }
                4 => {
                    // Drop alpha
                    rgb_pixels.extend_from_slice(&chunk[..3]);
                }
                1 => {
                    // Grayscale -> RGB
                    rgb_pixels.push(chunk[0]);
                    rgb_pixels.push(chunk[0]);
                    rgb_pixels.push(chunk[0]);
                }
                _ => {
                    return Err(Error::PdfRender {
                        page: page_num,
                        reason: format!("Unexpected pixel format with {n} components"),
                    });
                }
            }
        }

        let supersampled =
            RgbImage::from_raw(img_width, img_height, rgb_pixels).ok_or_else(|| {
                Error::PdfRender {
                    page: page_num,
                    reason: "Failed to create image buffer".to_string(),
                }
            })?;

        // Downscale to display size; the target dimensions come from the
        // intrinsic page bounds, never from the (rounded) pixmap size
        Ok(imageops::resize(
            &supersampled,
            target_width,
            target_height,
            imageops::FilterType::Lanczos3,
        ))
    }

    /// Render a page to a display-ready PNG.
    pub fn render_page_png(&self, page_num: usize) -> Result<RenderedPage> {
        let img = self.render_page(page_num)?;
        let (width, height) = img.dimensions();

        let mut png_data = Vec::new();
        // Fast compression keeps preview latency low (still lossless)
        let encoder = image::codecs::png::PngEncoder::new_with_quality(
            &mut png_data,
            image::codecs::png::CompressionType::Fast,
            image::codecs::png::FilterType::Adaptive,
        );

        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| Error::PdfRender {
                page: page_num,
                reason: format!("Failed to encode PNG: {e}"),
            })?;

        Ok(RenderedPage {
            png: png_data,
            width,
            height,
        })
    }
}

/// Convenience function to render a single page from a document as PNG.
pub fn render_page(doc: &PdfDocument, page_num: usize, config: RenderConfig) -> Result<RenderedPage> {
    PageRenderer::new(doc, config).render_page_png(page_num)
}
