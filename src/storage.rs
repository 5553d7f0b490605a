//! PDF persistence
//!
//! Bytes are written to a temporary file next to the target and renamed over
//! it once complete, so a failed write never leaves a partial PDF behind.

use crate::error::{Error, Result};
use crate::types::SavedPdf;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Prefix of the temporary files created while writing
const TEMP_PREFIX: &str = ".article-dl-";

/// Atomically create or overwrite `path` with `bytes`
///
/// The parent directory must already exist.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<SavedPdf> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".part")
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "PDF saved");

    Ok(SavedPdf {
        path: path.to_path_buf(),
        bytes: bytes.len() as u64,
    })
}

/// [`write_atomic`] on tokio's blocking pool
pub async fn write_atomic_async(path: PathBuf, bytes: Vec<u8>) -> Result<SavedPdf> {
    tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}
