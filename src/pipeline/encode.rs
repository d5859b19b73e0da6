//! Encoding and output: PNG bytes, base64 attachments, atomic file writes.
//!
//! PNG keeps line drawings and small print lossless. Every output file is
//! written to a sibling `*.tmp` path and renamed into place, so a failure
//! mid-write never leaves a truncated PNG or manifest behind.

use crate::error::SpatialError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} image → {} bytes PNG", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Base64 (standard alphabet, padded) for inline model attachments.
pub fn encode_document(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `path` via temp file + rename, replacing any existing file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SpatialError> {
    let write_failed = |source| SpatialError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, bytes).await.map_err(write_failed)?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_failed(e));
    }
    Ok(())
}
