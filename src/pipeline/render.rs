//! PDF rasterisation: render one page to a `DynamicImage`.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and keeps
//! thread-local state. [`render_page`] moves the work onto tokio's blocking
//! pool so the runtime's worker threads never stall on it.
//!
//! Page numbers are 1-based everywhere in this crate; the conversion to
//! pdfium's 0-based index happens in exactly one place below.

use crate::error::SpatialError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Something that can turn one PDF page into a raster image.
pub trait PageRenderer: Send + Sync {
    /// Render 1-based page `page_num` of the PDF at `pdf_path`.
    fn render_page(&self, pdf_path: &Path, page_num: u32) -> Result<DynamicImage, SpatialError>;
}

/// Renders pages with pdfium at a fixed DPI.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    dpi: u32,
    password: Option<String>,
}

impl PdfiumRenderer {
    pub fn new(dpi: u32, password: Option<String>) -> Self {
        Self { dpi, password }
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_page(&self, pdf_path: &Path, page_num: u32) -> Result<DynamicImage, SpatialError> {
        let failure = |detail: String| SpatialError::RenderFailure {
            path: pdf_path.to_path_buf(),
            page: page_num,
            detail,
        };

        if page_num == 0 {
            return Err(failure("page numbers start at 1".into()));
        }

        let pdfium = pdfium_auto::bind_pdfium_silent()
            .map_err(|e| SpatialError::PdfiumBindingFailed(e.to_string()))?;

        let document = pdfium
            .load_pdf_from_file(pdf_path, self.password.as_deref())
            .map_err(|e| {
                let detail = format!("{:?}", e);
                if detail.to_lowercase().contains("password") {
                    failure(format!("{detail} (wrong or missing --password)"))
                } else {
                    failure(detail)
                }
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as u32;
        if page_num > total_pages {
            return Err(failure(format!("document has {total_pages} pages")));
        }

        let page = pages
            .get((page_num - 1) as u16)
            .map_err(|e| failure(format!("{:?}", e)))?;

        let scale = self.dpi as f32 / 72.0;
        let width = (page.width().value * scale).round() as i32;
        let height = (page.height().value * scale).round() as i32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| failure(format!("{:?}", e)))?;

        let image = bitmap.as_image();
        if image.width() == 0 || image.height() == 0 {
            return Err(failure("renderer produced an empty image".into()));
        }

        debug!(
            "Rendered page {} at {} DPI → {}x{} px",
            page_num,
            self.dpi,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// Render one page on the blocking pool.
pub async fn render_page(
    renderer: Arc<dyn PageRenderer>,
    pdf_path: &Path,
    page_num: u32,
) -> Result<DynamicImage, SpatialError> {
    let path = pdf_path.to_path_buf();
    info!("Processing {} (Page {})...", path.display(), page_num);

    tokio::task::spawn_blocking(move || renderer.render_page(&path, page_num))
        .await
        .map_err(|e| SpatialError::Internal(format!("Render task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    struct Blank;

    impl PageRenderer for Blank {
        fn render_page(&self, _pdf_path: &Path, page_num: u32) -> Result<DynamicImage, SpatialError> {
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                10 * page_num,
                20,
                Rgba([255, 255, 255, 255]),
            )))
        }
    }

    #[tokio::test]
    async fn runs_renderer_on_blocking_pool() {
        let img = render_page(Arc::new(Blank), Path::new("any.pdf"), 3)
            .await
            .unwrap();
        assert_eq!((img.width(), img.height()), (30, 20));
    }

    #[test]
    fn pdfium_rejects_page_zero_before_binding() {
        let err = PdfiumRenderer::new(200, None)
            .render_page(Path::new("any.pdf"), 0)
            .unwrap_err();
        assert!(
            matches!(err, SpatialError::RenderFailure { page: 0, .. }),
            "{err:?}"
        );
    }
}
