//! Input resolution: check a user-supplied PDF path and read it.
//!
//! Existence is checked before anything else in both pipelines, so a typo
//! in a path never creates output directories or reaches the network.

use crate::error::SpatialError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists and return it as an owned path.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, SpatialError> {
    let path = path.as_ref().to_path_buf();
    if !path.is_file() {
        return Err(SpatialError::SourceNotFound { path });
    }
    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Read the whole document into memory. The file is closed on return.
pub async fn read_document(path: &Path) -> Result<Vec<u8>, SpatialError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => SpatialError::SourceNotFound {
                path: path.to_path_buf(),
            },
            _ => SpatialError::SourceUnreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_local(dir.path().join("nope.pdf")).unwrap_err();
        assert!(matches!(err, SpatialError::SourceNotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_local(dir.path()).unwrap_err();
        assert!(matches!(err, SpatialError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%%EOF\n").unwrap();
        let resolved = resolve_local(&path).unwrap();
        let bytes = read_document(&resolved).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
