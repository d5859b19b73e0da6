//! Asset extraction: crop one region of one PDF page into a PNG.
//!
//! The order of checks matters for side effects. The source path and the
//! bounding box are validated before the output directory is created, so a
//! bad invocation leaves the filesystem exactly as it found it.

use crate::config::ExtractionConfig;
use crate::error::SpatialError;
use crate::geometry::{crop_geometry, NormalizedBoundingBox};
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::pipeline::{crop, encode, input, render};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Crop the region `bbox` (`[ymin, xmin, ymax, xmax]` on a 0–1000 canvas)
/// from 1-based page `page_num` of `pdf_path`, writing
/// `{config.output_dir}/{output_name}.png`.
///
/// An existing file with the same name is replaced without warning.
///
/// # Errors
/// - [`SpatialError::SourceNotFound`]: `pdf_path` does not exist
/// - [`SpatialError::InvalidBoundingBox`]: `bbox` is not 4 numbers (or fails
///   strict validation when `config.strict_bbox` is on)
/// - [`SpatialError::RenderFailure`]: the page could not be rendered
/// - [`SpatialError::EmptyCropRegion`]: the box covers no pixels
/// - [`SpatialError::OutputWriteFailed`] / [`SpatialError::ImageEncodingFailed`]
pub async fn extract_asset(
    pdf_path: impl AsRef<Path>,
    page_num: u32,
    bbox: &[f64],
    output_name: &str,
    config: &ExtractionConfig,
) -> Result<PathBuf, SpatialError> {
    let start = Instant::now();

    // ── Step 1: Validate inputs (no side effects yet) ────────────────────
    let checked = preflight(pdf_path, bbox, output_name, config)?;
    let (pdf_path, normalized, output_path) = (checked.pdf_path, checked.bbox, checked.output_path);

    // ── Step 2: Ensure the output directory ──────────────────────────────
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|source| SpatialError::OutputWriteFailed {
            path: config.output_dir.clone(),
            source,
        })?;

    // ── Step 3: Render the page ──────────────────────────────────────────
    let renderer = resolve_renderer(config);
    let page = render::render_page(renderer, &pdf_path, page_num).await?;
    let (width, height) = (page.width(), page.height());

    // ── Step 4: Geometry + crop ──────────────────────────────────────────
    let pixel_box = crop_geometry(bbox, width, height)?;
    debug!(
        "bbox {} on {}x{} → left={:.2} top={:.2} right={:.2} bottom={:.2}",
        normalized, width, height, pixel_box.left, pixel_box.top, pixel_box.right, pixel_box.bottom
    );
    let cropped = crop::crop_page(&page, &pixel_box)?;
    drop(page);

    // ── Step 5: Encode + write ───────────────────────────────────────────
    let png = encode::encode_png(&cropped).map_err(|e| SpatialError::ImageEncodingFailed {
        path: output_path.clone(),
        detail: e.to_string(),
    })?;
    encode::write_atomic(&output_path, &png).await?;

    info!(
        "Asset extracted to {} ({}x{} px, {}ms)",
        output_path.display(),
        cropped.width(),
        cropped.height(),
        start.elapsed().as_millis()
    );
    Ok(output_path)
}

/// Inputs of one extraction that passed [`preflight`].
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedRequest {
    pub pdf_path: PathBuf,
    pub bbox: NormalizedBoundingBox,
    pub output_path: PathBuf,
}

/// Every check [`extract_asset`] makes before it touches the filesystem or
/// the PDF engine: source exists, bbox arity (and strict validation when
/// enabled), output name.
///
/// Callers that need expensive setup before rendering (downloading pdfium)
/// run this first so a bad invocation fails without side effects.
pub fn preflight(
    pdf_path: impl AsRef<Path>,
    bbox: &[f64],
    output_name: &str,
    config: &ExtractionConfig,
) -> Result<CheckedRequest, SpatialError> {
    let pdf_path = input::resolve_local(pdf_path)?;
    let bbox = NormalizedBoundingBox::from_slice(bbox)?;
    if config.strict_bbox {
        bbox.validate_strict()?;
    }
    let output_path = asset_path(&config.output_dir, output_name)?;
    Ok(CheckedRequest {
        pdf_path,
        bbox,
        output_path,
    })
}

/// Synchronous wrapper around [`extract_asset`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_asset_sync(
    pdf_path: impl AsRef<Path>,
    page_num: u32,
    bbox: &[f64],
    output_name: &str,
    config: &ExtractionConfig,
) -> Result<PathBuf, SpatialError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SpatialError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_asset(pdf_path, page_num, bbox, output_name, config))
}

/// `{output_dir}/{output_name}.png`, rejecting names that would escape the
/// directory or have no stem.
pub fn asset_path(output_dir: &Path, output_name: &str) -> Result<PathBuf, SpatialError> {
    let stem = output_name.trim();
    if stem.is_empty() || stem == "." || stem == ".." || output_name.contains(['/', '\\']) {
        return Err(SpatialError::InvalidConfig(format!(
            "output name must be a plain file stem, got {output_name:?}"
        )));
    }
    Ok(output_dir.join(format!("{output_name}.png")))
}

fn resolve_renderer(config: &ExtractionConfig) -> Arc<dyn PageRenderer> {
    match config.renderer {
        Some(ref renderer) => Arc::clone(renderer),
        None => Arc::new(PdfiumRenderer::new(config.dpi, config.password.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_path_appends_png() {
        assert_eq!(
            asset_path(Path::new("extracted_assets"), "tl5_dimensions").unwrap(),
            PathBuf::from("extracted_assets/tl5_dimensions.png")
        );
    }

    #[test]
    fn asset_path_rejects_separators() {
        assert!(asset_path(Path::new("out"), "../escape").is_err());
        assert!(asset_path(Path::new("out"), "a/b").is_err());
        assert!(asset_path(Path::new("out"), "  ").is_err());
        assert!(asset_path(Path::new("out"), " .. ").is_err());
    }

    #[test]
    fn preflight_checks_source_before_anything_else() {
        let config = ExtractionConfig::builder().output_dir("never-created").build().unwrap();
        let err = preflight("no/such/file.pdf", &[1.0, 2.0], "../x", &config).unwrap_err();
        assert!(matches!(err, SpatialError::SourceNotFound { .. }), "{err:?}");
        assert!(!Path::new("never-created").exists());
    }

    #[test]
    fn preflight_accepts_valid_request() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("a.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n%%EOF\n").unwrap();
        let out = dir.path().join("out");
        let config = ExtractionConfig::builder().output_dir(&out).build().unwrap();

        let checked = preflight(&pdf, &[100.0, 50.0, 400.0, 950.0], "fig", &config).unwrap();
        assert_eq!(checked.output_path, out.join("fig.png"));
        assert_eq!(checked.bbox.to_array(), [100.0, 50.0, 400.0, 950.0]);
        assert!(!out.exists());

        let err = preflight(&pdf, &[1.0, 2.0, 3.0], "fig", &config).unwrap_err();
        assert!(matches!(err, SpatialError::InvalidBoundingBox { .. }));
    }

    #[test]
    fn asset_path_keeps_name_verbatim() {
        assert_eq!(
            asset_path(Path::new("out"), " fig ").unwrap(),
            PathBuf::from("out/ fig .png")
        );
    }
}
