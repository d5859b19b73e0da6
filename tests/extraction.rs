//! Integration tests for the extraction pipeline.
//!
//! Rendering is replaced by an in-memory [`PageRenderer`] that paints a
//! known image, so these tests exercise the whole path from bounding box to
//! PNG on disk without needing pdfium or a sample PDF.

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use spatial_assets::{
    extract_asset, extract_asset_sync, ExtractionConfig, PageRenderer, SpatialError,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Renders a solid white page of a fixed size and records requested pages.
struct FakeRenderer {
    width: u32,
    height: u32,
    calls: Mutex<Vec<u32>>,
}

impl FakeRenderer {
    fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            width,
            height,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl PageRenderer for FakeRenderer {
    fn render_page(&self, _pdf_path: &Path, page_num: u32) -> Result<DynamicImage, SpatialError> {
        self.calls.lock().unwrap().push(page_num);
        let mut img = RgbaImage::from_pixel(self.width, self.height, Rgba([255, 255, 255, 255]));
        // Mark the top-left pixel so crops anchored at the origin can be checked.
        img.put_pixel(0, 0, Rgba([0, 0, 255, 255]));
        Ok(DynamicImage::ImageRgba8(img))
    }
}

/// Always fails, like pdfium asked for a page past the end.
struct NoPages;

impl PageRenderer for NoPages {
    fn render_page(&self, pdf_path: &Path, page_num: u32) -> Result<DynamicImage, SpatialError> {
        Err(SpatialError::RenderFailure {
            path: pdf_path.to_path_buf(),
            page: page_num,
            detail: "document has 2 pages".into(),
        })
    }
}

struct Workspace {
    dir: TempDir,
    pdf: PathBuf,
    out: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("datasheet.pdf");
    std::fs::write(&pdf, b"%PDF-1.4\n%%EOF\n").unwrap();
    let out = dir.path().join("assets");
    Workspace { dir, pdf, out }
}

fn config(out: &Path, renderer: Arc<dyn PageRenderer>) -> ExtractionConfig {
    ExtractionConfig::builder()
        .output_dir(out)
        .renderer(renderer)
        .build()
        .unwrap()
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_pdf_fails_without_side_effects() {
    let ws = workspace();
    let renderer = FakeRenderer::new(1000, 1000);
    let cfg = config(&ws.out, renderer.clone());

    let err = extract_asset(
        ws.dir.path().join("nope.pdf"),
        1,
        &[100.0, 50.0, 400.0, 950.0],
        "fig",
        &cfg,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SpatialError::SourceNotFound { .. }), "{err:?}");
    assert!(!ws.out.exists(), "output dir must not be created");
    assert!(renderer.calls().is_empty());
}

#[tokio::test]
async fn wrong_arity_fails_before_rendering() {
    let ws = workspace();
    let renderer = FakeRenderer::new(1000, 1000);
    let cfg = config(&ws.out, renderer.clone());

    for bbox in [&[100.0, 50.0, 400.0][..], &[1.0, 2.0, 3.0, 4.0, 5.0][..], &[][..]] {
        let err = extract_asset(&ws.pdf, 1, bbox, "fig", &cfg).await.unwrap_err();
        assert!(
            matches!(err, SpatialError::InvalidBoundingBox { .. }),
            "len {} → {err:?}",
            bbox.len()
        );
    }

    assert!(renderer.calls().is_empty());
    assert!(!ws.out.join("fig.png").exists());
}

#[tokio::test]
async fn render_failure_writes_nothing() {
    let ws = workspace();
    let cfg = config(&ws.out, Arc::new(NoPages));

    let err = extract_asset(&ws.pdf, 9, &[100.0, 50.0, 400.0, 950.0], "fig", &cfg)
        .await
        .unwrap_err();

    assert!(matches!(err, SpatialError::RenderFailure { page: 9, .. }), "{err:?}");
    assert!(!ws.out.join("fig.png").exists());
}

#[tokio::test]
async fn inverted_box_is_permissive_until_the_crop() {
    let ws = workspace();
    let renderer = FakeRenderer::new(1000, 1000);
    let cfg = config(&ws.out, renderer.clone());

    let err = extract_asset(&ws.pdf, 1, &[400.0, 50.0, 100.0, 950.0], "fig", &cfg)
        .await
        .unwrap_err();

    assert!(matches!(err, SpatialError::EmptyCropRegion { .. }), "{err:?}");
    assert_eq!(renderer.calls(), vec![1], "page was rendered before failing");
    assert!(!ws.out.join("fig.png").exists());
}

#[tokio::test]
async fn strict_mode_rejects_inverted_box_up_front() {
    let ws = workspace();
    let renderer = FakeRenderer::new(1000, 1000);
    let cfg = ExtractionConfig::builder()
        .output_dir(&ws.out)
        .renderer(renderer.clone())
        .strict_bbox(true)
        .build()
        .unwrap();

    let err = extract_asset(&ws.pdf, 1, &[400.0, 50.0, 100.0, 950.0], "fig", &cfg)
        .await
        .unwrap_err();

    assert!(matches!(err, SpatialError::InvalidBoundingBox { .. }), "{err:?}");
    assert!(renderer.calls().is_empty());
    assert!(!ws.out.exists());
}

// ── Happy paths ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_width_diagram_on_square_page() {
    let ws = workspace();
    let renderer = FakeRenderer::new(1000, 1000);
    let cfg = config(&ws.out, renderer.clone());

    let path = extract_asset(&ws.pdf, 2, &[100.0, 50.0, 400.0, 950.0], "wiring", &cfg)
        .await
        .unwrap();

    assert_eq!(path, ws.out.join("wiring.png"));
    assert_eq!(renderer.calls(), vec![2], "1-based page passed through unchanged");

    // (5, 85) – (995, 415)
    let png = image::open(&path).unwrap();
    assert_eq!(png.dimensions(), (990, 330));
}

#[tokio::test]
async fn corner_box_on_wide_page() {
    let ws = workspace();
    let cfg = config(&ws.out, FakeRenderer::new(2000, 1000));

    let path = extract_asset(&ws.pdf, 1, &[0.0, 0.0, 100.0, 100.0], "corner", &cfg)
        .await
        .unwrap();

    // Clamped to (0, 0) – (210, 105).
    let png = image::open(&path).unwrap();
    assert_eq!(png.dimensions(), (210, 105));
    assert_eq!(png.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
}

#[tokio::test]
async fn existing_output_is_overwritten_and_dir_reused() {
    let ws = workspace();
    std::fs::create_dir_all(&ws.out).unwrap();
    std::fs::write(ws.out.join("fig.png"), b"stale").unwrap();
    let cfg = config(&ws.out, FakeRenderer::new(800, 600));

    let path = extract_asset(&ws.pdf, 1, &[0.0, 0.0, 1000.0, 1000.0], "fig", &cfg)
        .await
        .unwrap();

    let png = image::open(&path).unwrap();
    assert_eq!(png.dimensions(), (800, 600));
    assert!(!ws.out.join("fig.png.tmp").exists());
}

#[tokio::test]
async fn nested_output_dir_is_created() {
    let ws = workspace();
    let nested = ws.out.join("tl5").join("ho");
    let cfg = config(&nested, FakeRenderer::new(500, 500));

    let path = extract_asset(&ws.pdf, 1, &[200.0, 200.0, 800.0, 800.0], "photo", &cfg)
        .await
        .unwrap();

    assert!(path.starts_with(&nested));
    assert!(path.exists());
}

#[test]
fn sync_wrapper_runs_its_own_runtime() {
    let ws = workspace();
    let cfg = config(&ws.out, FakeRenderer::new(1000, 1000));

    let path = extract_asset_sync(&ws.pdf, 1, &[100.0, 50.0, 400.0, 950.0], "sync", &cfg).unwrap();

    assert!(path.exists());
}
