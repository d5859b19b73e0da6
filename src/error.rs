//! Error type for the spatial-assets library.
//!
//! Every pipeline returns [`SpatialError`]. Both pipelines are one-shot, so
//! there is no page-level/partial-failure split: the first error ends the
//! call, and nothing is left behind on disk except an output directory that
//! may already have been created.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the spatial-assets library.
#[derive(Debug, Error)]
pub enum SpatialError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source PDF was not found at the given path.
    #[error("Source PDF not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Source PDF exists but could not be read into memory.
    #[error("Failed to read source PDF '{path}': {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bounding box has the wrong arity, or fails strict validation.
    #[error("Invalid bounding box: {reason}\nExpected [ymin, xmin, ymax, xmax] on a 0-1000 canvas.")]
    InvalidBoundingBox { reason: String },

    /// The padded box collapsed to zero pixels on the rendered page.
    #[error(
        "Crop region is empty on a {width}x{height} page: \
         left={left}, top={top}, right={right}, bottom={bottom}"
    )]
    EmptyCropRegion {
        width: u32,
        height: u32,
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    },

    /// CLI argument could not be parsed.
    #[error("Malformed value for {flag}: {detail}")]
    MalformedCliInput { flag: String, detail: String },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The renderer produced no image for the requested page.
    #[error("Failed to render page {page} of '{path}': {detail}")]
    RenderFailure {
        path: PathBuf,
        page: u32,
        detail: String,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Vision model errors ───────────────────────────────────────────────
    /// Required environment or credential is absent.
    #[error("Missing configuration: {name} is not set.\n{hint}")]
    ConfigurationMissing { name: String, hint: String },

    /// The model call failed, or its response was not a usable manifest.
    #[error("{service} failed: {detail}")]
    ExternalServiceFailure { service: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cropped image could not be encoded as PNG.
    #[error("Failed to encode '{path}' as PNG: {detail}")]
    ImageEncodingFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SpatialError {
    pub(crate) fn external(service: impl Into<String>, detail: impl Into<String>) -> Self {
        SpatialError::ExternalServiceFailure {
            service: service.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_bbox(reason: impl Into<String>) -> Self {
        SpatialError::InvalidBoundingBox {
            reason: reason.into(),
        }
    }

    /// True for errors that happen before any input is touched: the CLIs
    /// always exit non-zero on these.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            SpatialError::ConfigurationMissing { .. }
                | SpatialError::MalformedCliInput { .. }
                | SpatialError::InvalidConfig(_)
                | SpatialError::PdfiumBindingFailed(_)
        )
    }
}
