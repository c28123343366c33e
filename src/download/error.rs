//! Error types for the download module.
//!
//! This module defines structured errors for every way a single item can
//! fail, carrying enough context (URL, path, entry name) for user-facing
//! diagnostics.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while downloading and storing one manifest entry.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// HTTP error response. 5xx statuses are retryable, everything else is
    /// treated as a client error and fails the item immediately.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Name resolution or connection-level failure.
    #[error("connection error downloading {url}: {source}")]
    Resolve {
        /// The URL that failed to connect.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before the body was fully received.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Any other transport-level failure (TLS, body read, protocol errors).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The manifest URL is not parseable; never sent to the network.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The downloaded bytes do not match any known image format.
    #[error("unrecognized image content for {name}")]
    UnknownImageType {
        /// The entry name whose content could not be identified.
        name: String,
    },

    /// File system error while writing the downloaded image.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a connection/resolution error from a reqwest error.
    pub fn resolve(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Resolve {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a transport error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an unrecognized-content error for an entry.
    pub fn unknown_image_type(name: impl Into<String>) -> Self {
        Self::UnknownImageType { name: name.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or `From<std::io::Error>`
// because the variants require context (url, path, name) that the source errors
// don't provide. The helper constructors are the correct pattern here.
