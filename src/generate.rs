//! Manifest generation: ask a vision model to index the assets in a PDF.
//!
//! One request per document, no retries. The model's JSON is taken as-is
//! apart from `created_at` and `source_pdf`, which are always overwritten so
//! the manifest is consistent no matter what the model wrote there.

use crate::config::ManifestConfig;
use crate::error::SpatialError;
use crate::manifest::{manifest_path, source_basename, AssetManifest};
use crate::pipeline::{encode, input};
use crate::prompts::manifest_prompt;
use crate::vision::{resolve_extractor, VisionExtractor};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Generate a manifest for `pdf_path` using the extractor chosen by
/// [`resolve_extractor`].
///
/// Configuration is resolved before the source file is touched, so a
/// missing project or token fails fast with
/// [`SpatialError::ConfigurationMissing`].
pub async fn generate_manifest(
    pdf_path: impl AsRef<Path>,
    config: &ManifestConfig,
) -> Result<AssetManifest, SpatialError> {
    let extractor = resolve_extractor(config)?;
    generate_manifest_with(extractor.as_ref(), pdf_path).await
}

/// Generate a manifest for `pdf_path` with an explicit extractor.
///
/// # Errors
/// - [`SpatialError::SourceNotFound`] / [`SpatialError::SourceUnreadable`]
/// - [`SpatialError::ExternalServiceFailure`]: the call failed, or the
///   response was not a JSON manifest
pub async fn generate_manifest_with(
    extractor: &dyn VisionExtractor,
    pdf_path: impl AsRef<Path>,
) -> Result<AssetManifest, SpatialError> {
    let start = Instant::now();
    let pdf_path = input::resolve_local(pdf_path)?;
    info!("--- Processing: {} ---", pdf_path.display());

    let document = input::read_document(&pdf_path).await?;
    let prompt = manifest_prompt(&source_basename(&pdf_path));

    let response = extractor.submit(&document, &prompt).await?;
    drop(document);
    debug!(
        "{} answered in {}ms ({:?} input / {:?} output tokens)",
        extractor.name(),
        start.elapsed().as_millis(),
        response.input_tokens,
        response.output_tokens
    );

    let mut manifest = AssetManifest::from_model_response(extractor.name(), &response.text)?;
    manifest.stamp(&pdf_path, Utc::now());

    info!(
        "Manifest for {}: {} assets",
        manifest.source_pdf,
        manifest.assets.len()
    );
    Ok(manifest)
}

/// Persist `manifest` as 2-space indented JSON at
/// `{output_dir}/{pdf-stem}.json`, replacing any existing file.
pub async fn write_manifest(
    manifest: &AssetManifest,
    pdf_path: &Path,
    output_dir: &Path,
) -> Result<PathBuf, SpatialError> {
    let path = manifest_path(output_dir, pdf_path);
    let json = manifest.to_pretty_json()?;

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| SpatialError::OutputWriteFailed {
            path: output_dir.to_path_buf(),
            source,
        })?;
    encode::write_atomic(&path, json.as_bytes()).await?;

    info!("Manifest saved to {}", path.display());
    Ok(path)
}

/// Generate with an explicit extractor, then persist to `config.output_dir`.
///
/// Nothing is written unless generation succeeded.
pub async fn generate_manifest_to_file_with(
    extractor: &dyn VisionExtractor,
    pdf_path: impl AsRef<Path>,
    config: &ManifestConfig,
) -> Result<(AssetManifest, PathBuf), SpatialError> {
    let pdf_path = pdf_path.as_ref();
    let manifest = generate_manifest_with(extractor, pdf_path).await?;
    let path = write_manifest(&manifest, pdf_path, &config.output_dir).await?;
    Ok((manifest, path))
}

/// [`generate_manifest`] followed by [`write_manifest`].
pub async fn generate_manifest_to_file(
    pdf_path: impl AsRef<Path>,
    config: &ManifestConfig,
) -> Result<(AssetManifest, PathBuf), SpatialError> {
    let extractor = resolve_extractor(config)?;
    generate_manifest_to_file_with(extractor.as_ref(), pdf_path, config).await
}

/// Synchronous wrapper around [`generate_manifest_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_manifest_sync(
    pdf_path: impl AsRef<Path>,
    config: &ManifestConfig,
) -> Result<(AssetManifest, PathBuf), SpatialError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SpatialError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_manifest_to_file(pdf_path, config))
}
