//! Partitioned on-disk layout for downloaded images.
//!
//! Every entry lands at `<out_dir>/<partition>/<name>.<ext>` where the
//! partition is the leading underscore-delimited segment of the entry name
//! (e.g. `n01440764_18` goes under `n01440764/`). Partitioning bounds the
//! fan-out of any single directory.
//!
//! The pre-download cache check probes for a `.jpg` path only: the real
//! extension is not known until the body has been fetched and sniffed, and
//! the overwhelming majority of entries are JPEGs. An entry previously
//! stored with a different extension is re-downloaded. Known limitation
//! carried over from the original tooling.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::DownloadError;

/// Extension assumed by the pre-download cache-existence check.
pub const CACHED_EXT: &str = "jpg";

/// Returns the partition for an entry name: the segment before the first
/// underscore, or the whole name when there is none.
#[must_use]
pub fn partition(name: &str) -> &str {
    name.split('_').next().unwrap_or(name)
}

/// Computes the target path for an entry with a known extension.
#[must_use]
pub fn target_path(out_dir: &Path, name: &str, ext: &str) -> PathBuf {
    out_dir.join(partition(name)).join(format!("{name}.{ext}"))
}

/// Tests whether an entry already exists on disk at its assumed `.jpg`
/// target path. Pure query, no side effects.
#[must_use]
pub fn is_cached(out_dir: &Path, name: &str) -> bool {
    target_path(out_dir, name, CACHED_EXT).is_file()
}

/// Creates the partition directory for an entry if it does not exist yet.
///
/// Idempotent; concurrent workers racing on the same partition both succeed.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] when the directory cannot be created.
pub async fn ensure_partition_dir(out_dir: &Path, name: &str) -> Result<(), DownloadError> {
    let dir = out_dir.join(partition(name));
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| DownloadError::io(&dir, e))
}

/// Writes the downloaded bytes to their target path.
///
/// Write failures are terminal for the item; the write is never retried.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] when the write fails.
pub async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}
