//! CLI binary: build a visual-asset manifest for a PDF with a vision model.
//!
//! Resolves the backend once (exiting non-zero if credentials are missing),
//! sends the document, prints the manifest and saves it under
//! `output_manifests/`.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use spatial_assets::term::{bold, dim, green, red};
use spatial_assets::{generate_manifest_to_file_with, resolve_extractor, ManifestConfig};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Index a datasheet with Gemini on Vertex AI
  export GOOGLE_CLOUD_PROJECT=my-project
  spatial-manifest datasheet.pdf

  # Use a different model and region
  GEMINI_MODEL_NAME=gemini-2.5-pro GOOGLE_CLOUD_LOCATION=europe-west4 spatial-manifest datasheet.pdf

  # Use an edgequake-llm provider instead of Vertex AI
  GEMINI_API_KEY=... spatial-manifest --provider gemini --model gemini-2.5-flash datasheet.pdf

ENVIRONMENT VARIABLES:
  GOOGLE_CLOUD_PROJECT       Vertex AI project (required unless --provider is given)
  GOOGLE_CLOUD_LOCATION      Vertex AI region (default: us-central1)
  GEMINI_MODEL_NAME          Model identifier (default: gemini-3-pro-preview)
  GOOGLE_CLOUD_ACCESS_TOKEN  OAuth token; otherwise `gcloud auth print-access-token` is used
  SPATIAL_MANIFEST_DIR       Default for --output-dir (fallback: output_manifests)
"#;

/// Extract a structured visual asset manifest from a PDF using a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "spatial-manifest",
    version,
    about = "Extract a structured visual asset manifest from a PDF using Gemini Vision",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local path to the PDF datasheet.
    pdf_path: PathBuf,

    /// Directory the manifest JSON is written to.
    #[arg(long, env = "SPATIAL_MANIFEST_DIR", default_value = "output_manifests")]
    output_dir: PathBuf,

    /// Model identifier; overrides GEMINI_MODEL_NAME.
    #[arg(long)]
    model: Option<String>,

    /// edgequake-llm provider (gemini, openai, anthropic, …) instead of Vertex AI.
    #[arg(long, env = "SPATIAL_VISION_PROVIDER")]
    provider: Option<String>,

    /// Timeout for the model request in seconds (default: none).
    #[arg(long, env = "SPATIAL_REQUEST_TIMEOUT")]
    timeout: Option<u64>,

    /// Exit non-zero when generation fails (default: report and exit 0).
    #[arg(long, env = "SPATIAL_FAIL_ON_ERROR")]
    fail_on_error: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors; the manifest is not echoed.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries the feedback that matters while waiting on the
    // model, so library INFO logs are hidden unless --verbose.
    let show_spinner = !cli.quiet && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_spinner {
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

    // ── Resolve configuration once (fatal on failure) ────────────────────
    let config = build_config(&cli);
    let extractor = resolve_extractor(&config).context("Failed to initialize vision backend")?;

    // ── Run generation ───────────────────────────────────────────────────
    let spinner = show_spinner.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Analysing");
        bar.set_message(format!("{} via {}", cli.pdf_path.display(), extractor.name()));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = generate_manifest_to_file_with(extractor.as_ref(), &cli.pdf_path, &config).await;

    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }

    match result {
        Ok((manifest, path)) => {
            if !cli.quiet {
                let json = manifest.to_pretty_json().context("Failed to serialise manifest")?;
                println!("{}", dim("--- EXTRACTED MANIFEST ---"));
                println!("{json}");
                println!("{}", dim("--- END OF MANIFEST ---"));
                eprintln!(
                    "{} {} assets  →  {}",
                    green("✔"),
                    bold(&manifest.assets.len().to_string()),
                    bold(&path.display().to_string())
                );
            }
            Ok(())
        }
        Err(e) if cli.fail_on_error || e.is_fatal_setup() => {
            Err(e).context("Manifest generation failed")
        }
        Err(e) => {
            eprintln!("{} FAILED to generate manifest: {e}", red("✘"));
            Ok(())
        }
    }
}

/// Environment first, then CLI overrides.
fn build_config(cli: &Cli) -> ManifestConfig {
    let mut config = ManifestConfig::from_env();
    config.output_dir = cli.output_dir.clone();
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    config.provider_name = cli.provider.clone();
    config.request_timeout_secs = cli.timeout.map(|s| s.max(1));
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_takes_one_positional_pdf() {
        let cli = Cli::try_parse_from(["spatial-manifest", "datasheet.pdf"]).unwrap();
        assert_eq!(cli.pdf_path, PathBuf::from("datasheet.pdf"));
        assert!(cli.provider.is_none());
    }

    #[test]
    fn cli_overrides_model() {
        let cli = Cli::try_parse_from([
            "spatial-manifest", "--model", "gemini-2.5-pro", "--timeout", "0", "a.pdf",
        ])
        .unwrap();
        let config = build_config(&cli);
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.request_timeout_secs, Some(1));
    }
}
