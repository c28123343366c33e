//! HTTP client wrapper for fetching whole image bodies.
//!
//! This module provides the `HttpClient` struct which performs a single
//! timed GET and classifies the ways it can fail. There is no streaming:
//! image bodies are small enough to hold in memory so they can be sniffed
//! before anything touches the disk.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP client for fetching image bodies.
///
/// This client is designed to be created once and reused for every entry in
/// a batch, taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use imagedl_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let bytes = client
///     .fetch("http://example.com/n01440764_18.jpg", Duration::from_secs(10))
///     .await?;
/// println!("fetched {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// The hard timeout is applied per request in [`fetch`](Self::fetch),
    /// not on the client, so one shared client serves batches with
    /// different timeout configurations.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = ClientBuilder::new()
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches the full body at `url` with a hard timeout.
    ///
    /// Issues a single GET; no retries happen at this layer.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] when the URL does not parse (never
    ///   sent to the network)
    /// - [`DownloadError::HttpStatus`] for any non-success response status
    /// - [`DownloadError::Resolve`] for DNS/connection-level failures
    /// - [`DownloadError::Timeout`] when the timeout elapses first
    /// - [`DownloadError::Network`] for any other transport failure,
    ///   including failures while reading the body
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<Bytes, DownloadError> {
        if Url::parse(url).is_err() {
            return Err(DownloadError::invalid_url(url));
        }

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "error status");
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        debug!(bytes = bytes.len(), "fetched body");
        Ok(bytes)
    }
}

/// Maps a reqwest transport error onto the download error taxonomy.
fn classify_reqwest_error(url: &str, error: reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::timeout(url)
    } else if error.is_connect() {
        DownloadError::resolve(url, error)
    } else {
        DownloadError::network(url, error)
    }
}
