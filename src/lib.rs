//! # spatial-assets
//!
//! Pull diagrams, drawings and photos out of PDF technical documents.
//!
//! Datasheets bury their most useful content in images: wiring diagrams,
//! dimensional drawings, spectral charts. This crate indexes those images
//! with a vision model and crops them out as standalone PNGs, ready for a
//! RAG index or product documentation.
//!
//! ## Two pipelines
//!
//! ```text
//! Manifest   PDF ──▶ vision model (Gemini on Vertex AI, or any edgequake-llm provider)
//!                ──▶ output_manifests/<stem>.json   { assets: [{ page_number, bounding_box, … }] }
//!
//! Extraction PDF + page + bounding_box ──▶ render page (pdfium)
//!                ──▶ pad 5% + clamp + scale ──▶ extracted_assets/<name>.png
//! ```
//!
//! The pipelines share nothing at runtime; the manifest file is the contract
//! between them. Bounding boxes are `[ymin, xmin, ymax, xmax]` on a 0–1000
//! canvas that stretches to whatever size the page renders at. See
//! [`geometry`] for the exact transform.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spatial_assets::{extract_asset, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::from_env();
//!     let png = extract_asset("datasheet.pdf", 2, &[100.0, 50.0, 400.0, 950.0], "dimensions", &config).await?;
//!     println!("wrote {}", png.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `extract-asset` and `spatial-manifest` binaries |
//! | `bundled` | off     | Embeds the pdfium shared library in the binaries |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod generate;
pub mod geometry;
pub mod manifest;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "cli")]
pub mod term;
pub mod vision;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, ManifestConfig, ManifestConfigBuilder,
};
pub use error::SpatialError;
pub use extract::{extract_asset, extract_asset_sync, preflight, CheckedRequest};
pub use generate::{
    generate_manifest, generate_manifest_sync, generate_manifest_to_file,
    generate_manifest_to_file_with, generate_manifest_with, write_manifest,
};
pub use geometry::{crop_geometry, NormalizedBoundingBox, PixelBox};
pub use manifest::{AssetEntry, AssetManifest, AssetType};
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use vision::{
    resolve_extractor, LlmProviderExtractor, VertexGeminiExtractor, VisionExtractor,
    VisionResponse,
};
