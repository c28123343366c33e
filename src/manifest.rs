//! Manifest parsing into (name, URL) entries.
//!
//! A manifest is plain text with one record per line: an entry name, a run
//! of whitespace, and the remainder of the line as the URL. Lines that do
//! not yield both tokens are malformed.
//!
//! # Accounting
//!
//! Every line counts toward the batch total, malformed or not, and each
//! malformed line contributes exactly one failure before dispatch. This
//! keeps the progress denominator equal to the line count while still
//! reconciling `succeeded + failed == total` at the end of the run.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {source}")]
    Io {
        /// The manifest path that could not be read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// One well-formed (name, URL) record.
///
/// Identity is manifest position; names are not deduplicated. Two entries
/// sharing a name race on the same target path, which is documented as
/// undefined behavior rather than a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry name; its leading underscore-delimited segment selects the
    /// output partition.
    pub name: String,
    /// Download URL (the whole remainder of the manifest line).
    pub url: String,
}

/// A manifest line that did not split into both tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number in the manifest.
    pub line_number: usize,
    /// The raw line content.
    pub raw: String,
}

/// A parsed manifest: dispatchable entries plus malformed-line records.
#[derive(Debug, Default)]
pub struct Manifest {
    /// Well-formed entries, in manifest order.
    pub entries: Vec<Entry>,
    /// Lines that failed to parse, kept for failure accounting.
    pub malformed: Vec<MalformedLine>,
}

impl Manifest {
    /// Parses manifest text.
    ///
    /// Each line is split at its first whitespace run into a name and the
    /// remainder-as-URL. Blank lines and lines with a single token are
    /// recorded as malformed.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut manifest = Self::default();

        for (idx, line) in text.lines().enumerate() {
            match split_record(line) {
                Some((name, url)) => manifest.entries.push(Entry {
                    name: name.to_string(),
                    url: url.to_string(),
                }),
                None => manifest.malformed.push(MalformedLine {
                    line_number: idx + 1,
                    raw: line.to_string(),
                }),
            }
        }

        debug!(
            entries = manifest.entries.len(),
            malformed = manifest.malformed.len(),
            "parsed manifest"
        );

        manifest
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] when the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::parse(&text))
    }

    /// Total number of manifest lines, malformed included.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.len() + self.malformed.len()
    }
}

/// Splits one line into (name, remainder-as-URL), or `None` when either
/// token is missing.
fn split_record(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    let (name, rest) = trimmed.split_once(char::is_whitespace)?;
    let url = rest.trim_start();
    if url.is_empty() { None } else { Some((name, url)) }
}
