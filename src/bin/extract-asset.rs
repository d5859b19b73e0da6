//! CLI binary: crop one visual asset out of a PDF page.
//!
//! A thin shim over [`spatial_assets::extract_asset`] that maps flags to an
//! `ExtractionConfig` and reports the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use spatial_assets::term::{bold, green, red};
use spatial_assets::{extract_asset, preflight, ExtractionConfig, SpatialError};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Full-width diagram in the top half of page 2
  extract-asset --pdf datasheet.pdf --page 2 --bbox "[100, 50, 400, 950]" --name wiring

  # Custom output directory and higher resolution
  extract-asset --pdf datasheet.pdf --page 1 --bbox "[520, 60, 880, 940]" \
                --name spectrum --outdir assets --dpi 300

  # Feed entries from a manifest (one invocation per asset)
  jq -c '.assets[] | [.page_number, .bounding_box]' output_manifests/datasheet.json

BOUNDING BOXES:
  [ymin, xmin, ymax, xmax] on a 0-1000 canvas for both axes. Each box is padded
  by 5% of its own height/width on every side and clamped to the page, so
  axis labels and legends next to a diagram are kept.

ENVIRONMENT VARIABLES:
  SPATIAL_OUTPUT_DIR      Default for --outdir (fallback: extracted_assets)
  SPATIAL_DPI             Default for --dpi (fallback: 200)
  PDFIUM_LIB_PATH         Path to an existing libpdfium (skips auto-download)
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
"#;

/// Extract a visual asset from a PDF using normalized spatial coordinates.
#[derive(Parser, Debug)]
#[command(
    name = "extract-asset",
    version,
    about = "Extract a visual asset from a PDF using spatial coordinates",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the source PDF document.
    #[arg(long)]
    pdf: PathBuf,

    /// 1-based page number.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// JSON list of coordinates [ymin, xmin, ymax, xmax], e.g. "[100, 50, 400, 950]".
    #[arg(long, allow_hyphen_values = true)]
    bbox: String,

    /// Output filename (no extension).
    #[arg(long)]
    name: String,

    /// Output directory.
    #[arg(long, env = "SPATIAL_OUTPUT_DIR", default_value = "extracted_assets")]
    outdir: PathBuf,

    /// Rendering DPI (72–600).
    #[arg(long, env = "SPATIAL_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "SPATIAL_PDF_PASSWORD")]
    password: Option<String>,

    /// Reject inverted or off-canvas boxes instead of passing them through.
    #[arg(long)]
    strict_bbox: bool,

    /// Exit non-zero when extraction fails (default: report and exit 0).
    #[arg(long, env = "SPATIAL_FAIL_ON_ERROR")]
    fail_on_error: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Parse --bbox before touching anything ────────────────────────────
    let bbox = parse_bbox(&cli.bbox).context("Invalid --bbox")?;

    let mut builder = ExtractionConfig::builder()
        .output_dir(&cli.outdir)
        .dpi(cli.dpi)
        .strict_bbox(cli.strict_bbox);
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run extraction ───────────────────────────────────────────────────
    let quiet = cli.quiet;
    let outcome = run(&cli.pdf, cli.page, &bbox, &cli.name, &config, || {
        ensure_pdfium(quiet)
    })
    .await;

    match outcome {
        Ok(path) => {
            if !cli.quiet {
                eprintln!(
                    "{} Asset extracted to: {}",
                    green("✔"),
                    bold(&path.display().to_string())
                );
            }
            Ok(())
        }
        Err(e) if cli.fail_on_error || e.is_fatal_setup() => Err(e).context("Extraction failed"),
        Err(e) => {
            eprintln!("{} FAILED to extract asset: {e}", red("✘"));
            Ok(())
        }
    }
}

/// Validate the request, then prepare pdfium, then extract. A missing PDF or
/// a bad box is reported before any engine download or cache write.
async fn run(
    pdf: &Path,
    page: u32,
    bbox: &[f64],
    name: &str,
    config: &ExtractionConfig,
    setup_engine: impl FnOnce() -> Result<(), SpatialError>,
) -> Result<PathBuf, SpatialError> {
    preflight(pdf, bbox, name, config)?;
    setup_engine()?;
    extract_asset(pdf, page, bbox, name, config).await
}

/// Parse `--bbox` as a JSON array of numbers. Arity is checked later by the
/// library so that it is reported like any other extraction failure.
fn parse_bbox(s: &str) -> std::result::Result<Vec<f64>, SpatialError> {
    serde_json::from_str::<Vec<f64>>(s).map_err(|e| SpatialError::MalformedCliInput {
        flag: "--bbox".into(),
        detail: format!(
            "{e}. Expected a JSON list like [ymin, xmin, ymax, xmax], got {s:?}"
        ),
    })
}

/// Make sure a pdfium library is available, showing download progress the
/// first time.
fn ensure_pdfium(quiet: bool) -> std::result::Result<(), SpatialError> {
    #[cfg(feature = "bundled")]
    {
        let _ = quiet;
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_bundled()).map_err(|e| {
            SpatialError::PdfiumBindingFailed(format!("Failed to extract bundled PDFium engine: {e}"))
        })?;
    }

    #[cfg(not(feature = "bundled"))]
    if !pdfium_auto::is_pdfium_cached() {
        if quiet {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .map_err(download_failed)?;
            return Ok(());
        }

        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        dl_bar.set_prefix("PDF engine");
        dl_bar.enable_steady_tick(Duration::from_millis(80));

        let bar = dl_bar.clone();
        tokio::task::block_in_place(|| {
            pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                if let Some(t) = total {
                    if bar.length().unwrap_or(0) != t {
                        bar.set_length(t);
                    }
                }
                bar.set_position(downloaded);
            }))
        })
        .map_err(download_failed)?;

        dl_bar.finish_with_message("ready ✓");
    }

    Ok(())
}

#[cfg(not(feature = "bundled"))]
fn download_failed(e: impl std::fmt::Display) -> SpatialError {
    SpatialError::PdfiumBindingFailed(format!("Failed to download PDFium engine: {e}"))
}
