//! Download engine for concurrent manifest processing with retry support.
//!
//! This module provides the `DownloadEngine` which coordinates concurrent
//! per-entry downloads using a semaphore-based concurrency control pattern,
//! with retry on transient failures and idempotent skip-if-exists caching.
//!
//! # Overview
//!
//! The engine fans out over the entries of a [`Manifest`], fetching each
//! one with an [`HttpClient`], sniffing the image kind from the body, and
//! writing the file into its partition directory. Shared [`DownloadStats`]
//! counters receive exactly one terminal increment per manifest line.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use imagedl_core::download::{DownloadEngine, DownloadStats, HttpClient, RetryPolicy};
//! use imagedl_core::manifest::Manifest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = Manifest::parse("n01440764_18 http://x/a.jpg");
//! let engine = DownloadEngine::new(
//!     8,
//!     RetryPolicy::default(),
//!     Duration::from_secs(10),
//!     Duration::from_secs(1),
//! )?;
//! let client = HttpClient::new();
//! let stats = Arc::new(DownloadStats::new());
//! engine
//!     .process_manifest(&manifest, &client, Path::new("./images"), &stats)
//!     .await?;
//! println!("succeeded: {}, failed: {}", stats.succeeded(), stats.failed());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::retry::{RetryDecision, RetryPolicy, classify_error};
use super::store;
use super::{DownloadError, HttpClient};
use crate::imgtype::ImageKind;
use crate::manifest::{Entry, Manifest};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Error type for download engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Shared success/failure counters for one batch run.
///
/// Each manifest line contributes exactly one increment to exactly one
/// counter, on its terminal outcome only (never per retry attempt), so
/// `succeeded + failed <= total` at all times and equality holds once the
/// batch call returns. The progress reporter takes snapshot reads and
/// tolerates slight staleness.
#[derive(Debug, Default)]
pub struct DownloadStats {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries that reached terminal success
    /// (downloaded or already cached).
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    /// Returns the number of entries that reached terminal failure.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the total number of entries processed so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.succeeded() + self.failed()
    }

    /// Increments the success counter.
    fn increment_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the failure counter.
    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Terminal success outcome for one entry.
#[derive(Debug)]
enum ItemOutcome {
    /// The target file already existed; no network, no write.
    Cached,
    /// The entry was fetched and written to the given path.
    Downloaded(PathBuf),
}

/// Download engine for concurrent manifest processing.
///
/// # Concurrency Model
///
/// - Each entry runs in its own Tokio task
/// - A semaphore permit is acquired before spawning each task and held for
///   the task's whole lifetime, including the post-success throttle sleep
/// - Permits are released automatically when tasks complete (RAII)
///
/// # Retry Behavior
///
/// - Transient errors (5xx, DNS/connect failures, timeouts) are retried
///   with a fixed inter-retry sleep
/// - Permanent errors (other HTTP statuses, invalid URLs) fail the entry
///   immediately without consuming the retry budget
///
/// # Failure Isolation
///
/// Per-entry failures never abort the batch: every failure is converted
/// into one failure-counter increment and a `warn!` diagnostic at the
/// worker boundary.
#[derive(Debug)]
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured concurrency limit.
    concurrency: usize,
    /// Retry policy for failed fetches.
    retry_policy: RetryPolicy,
    /// Hard timeout per fetch attempt.
    timeout: Duration,
    /// Throttle sleep after each successful download.
    sleep_after_download: Duration,
}

impl DownloadEngine {
    /// Creates a new download engine.
    ///
    /// # Arguments
    ///
    /// * `concurrency` - Maximum number of concurrently in-flight entries (1-100)
    /// * `retry_policy` - Policy for retrying failed fetches
    /// * `timeout` - Hard timeout applied to each fetch attempt
    /// * `sleep_after_download` - Fixed sleep after each successful download
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    #[instrument(level = "debug", skip(retry_policy))]
    pub fn new(
        concurrency: usize,
        retry_policy: RetryPolicy,
        timeout: Duration,
        sleep_after_download: Duration,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(
            concurrency,
            max_retries = retry_policy.max_retries(),
            timeout_ms = timeout.as_millis(),
            sleep_after_download_ms = sleep_after_download.as_millis(),
            "creating download engine"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            retry_policy,
            timeout,
            sleep_after_download,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Processes every line of the manifest.
    ///
    /// Malformed lines are accounted as failures up front, without a task
    /// or a network attempt. Well-formed entries are then dispatched with
    /// at most `concurrency` in flight at once. The call returns only when
    /// every entry has reached a terminal outcome; completion order across
    /// entries is unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    ///
    /// Note: Individual entry failures do NOT cause this method to error.
    /// They are counted in `stats` and surfaced as `warn!` diagnostics.
    #[instrument(skip(self, manifest, client, stats), fields(out_dir = %out_dir.display()))]
    pub async fn process_manifest(
        &self,
        manifest: &Manifest,
        client: &HttpClient,
        out_dir: &Path,
        stats: &Arc<DownloadStats>,
    ) -> Result<(), EngineError> {
        info!(
            entries = manifest.entries.len(),
            malformed = manifest.malformed.len(),
            "starting batch"
        );

        // Malformed lines count toward the total as failures but are never
        // dispatched.
        for line in &manifest.malformed {
            warn!(
                line_number = line.line_number,
                raw = %line.raw,
                "malformed manifest line"
            );
            stats.increment_failed();
        }

        let mut handles = Vec::with_capacity(manifest.entries.len());

        for entry in &manifest.entries {
            // Acquire semaphore permit (blocks if at concurrency limit)
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            // Clone values for the spawned task
            let entry = entry.clone();
            let client = client.clone();
            let stats = Arc::clone(stats);
            let out_dir = out_dir.to_path_buf();
            let retry_policy = self.retry_policy.clone();
            let timeout = self.timeout;
            let sleep_after_download = self.sleep_after_download;

            handles.push(tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = permit;

                process_entry(
                    &client,
                    &entry,
                    &out_dir,
                    &retry_policy,
                    timeout,
                    sleep_after_download,
                    &stats,
                )
                .await;
            }));
        }

        debug!(task_count = handles.len(), "waiting for entries to finish");

        // Wait for all tasks to complete
        for handle in handles {
            // Task panics are logged but don't fail the batch
            if let Err(e) = handle.await {
                warn!(error = %e, "entry task panicked");
            }
        }

        info!(
            succeeded = stats.succeeded(),
            failed = stats.failed(),
            total = manifest.total(),
            "batch complete"
        );

        Ok(())
    }
}

/// Runs one entry to a terminal outcome and records it.
///
/// Never propagates an error outward: every failure is converted into one
/// failure-counter increment plus a diagnostic.
#[instrument(skip_all, fields(name = %entry.name))]
async fn process_entry(
    client: &HttpClient,
    entry: &Entry,
    out_dir: &Path,
    policy: &RetryPolicy,
    timeout: Duration,
    sleep_after_download: Duration,
    stats: &DownloadStats,
) {
    match download_entry(client, entry, out_dir, policy, timeout).await {
        Ok(ItemOutcome::Cached) => {
            debug!("already on disk, skipping");
            stats.increment_succeeded();
        }
        Ok(ItemOutcome::Downloaded(path)) => {
            debug!(path = %path.display(), "download completed");
            stats.increment_succeeded();
            // Post-success throttle; holds the concurrency slot on purpose
            tokio::time::sleep(sleep_after_download).await;
        }
        Err(e) => {
            warn!(url = %entry.url, error = %e, "entry failed");
            stats.increment_failed();
        }
    }
}

/// Cache check, fetch-with-retry, sniff, and write for one entry.
async fn download_entry(
    client: &HttpClient,
    entry: &Entry,
    out_dir: &Path,
    policy: &RetryPolicy,
    timeout: Duration,
) -> Result<ItemOutcome, DownloadError> {
    if store::is_cached(out_dir, &entry.name) {
        return Ok(ItemOutcome::Cached);
    }

    let bytes = fetch_with_retry(client, entry, policy, timeout).await?;

    let kind = ImageKind::detect(&bytes)
        .ok_or_else(|| DownloadError::unknown_image_type(&entry.name))?;

    store::ensure_partition_dir(out_dir, &entry.name).await?;

    let path = store::target_path(out_dir, &entry.name, kind.extension());
    store::write_bytes(&path, &bytes).await?;

    Ok(ItemOutcome::Downloaded(path))
}

/// Fetches an entry's body, retrying transient failures.
///
/// Sleeps the policy's fixed delay before every retry and never before the
/// first attempt. Returns the last error once the budget is exhausted or a
/// permanent failure occurs.
async fn fetch_with_retry(
    client: &HttpClient,
    entry: &Entry,
    policy: &RetryPolicy,
    timeout: Duration,
) -> Result<Bytes, DownloadError> {
    let mut failed_attempts = 0u32;

    loop {
        match client.fetch(&entry.url, timeout).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                failed_attempts += 1;

                match policy.should_retry(classify_error(&e), failed_attempts) {
                    RetryDecision::Retry { delay } => {
                        warn!(
                            name = %entry.name,
                            url = %entry.url,
                            failed_attempts,
                            max_retries = policy.max_retries(),
                            delay_ms = delay.as_millis(),
                            error = %e,
                            "retrying fetch"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::GiveUp { reason } => {
                        debug!(url = %entry.url, %reason, "not retrying fetch");
                        return Err(e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    /// Helper to build an engine with fast test timings.
    fn test_engine(concurrency: usize) -> DownloadEngine {
        DownloadEngine::new(
            concurrency,
            RetryPolicy::new(0, Duration::from_millis(1)),
            Duration::from_secs(1),
            Duration::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn test_engine_new_valid_concurrency() {
        assert_eq!(test_engine(1).concurrency(), 1);
        assert_eq!(test_engine(10).concurrency(), 10);
        assert_eq!(test_engine(100).concurrency(), 100);
    }

    #[test]
    fn test_engine_new_invalid_concurrency_zero() {
        let result = DownloadEngine::new(
            0,
            RetryPolicy::default(),
            Duration::from_secs(10),
            Duration::from_secs(1),
        );
        assert!(matches!(
            result,
            Err(EngineError::InvalidConcurrency { value: 0 })
        ));
    }

    #[test]
    fn test_engine_new_invalid_concurrency_too_high() {
        let result = DownloadEngine::new(
            101,
            RetryPolicy::default(),
            Duration::from_secs(10),
            Duration::from_secs(1),
        );
        assert!(matches!(
            result,
            Err(EngineError::InvalidConcurrency { value: 101 })
        ));
    }

    #[test]
    fn test_engine_stores_retry_policy() {
        let engine = DownloadEngine::new(
            10,
            RetryPolicy::with_max_retries(5),
            Duration::from_secs(10),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(engine.retry_policy().max_retries(), 5);
    }

    #[test]
    fn test_download_stats_default() {
        let stats = DownloadStats::default();
        assert_eq!(stats.succeeded(), 0);
        assert_eq!(stats.failed(), 0);
        assert_eq!(stats.processed(), 0);
    }

    #[test]
    fn test_download_stats_increment() {
        let stats = DownloadStats::new();

        stats.increment_succeeded();
        stats.increment_succeeded();
        stats.increment_failed();

        assert_eq!(stats.succeeded(), 2);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.processed(), 3);
    }

    #[test]
    fn test_download_stats_thread_safe() {
        use std::thread;

        let stats = Arc::new(DownloadStats::new());
        let mut handles = Vec::new();

        // Spawn multiple threads incrementing counters
        for _ in 0..10 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats.increment_succeeded();
                    stats.increment_failed();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // 10 threads * 100 increments each
        assert_eq!(stats.succeeded(), 1000);
        assert_eq!(stats.failed(), 1000);
        assert_eq!(stats.processed(), 2000);
    }

    #[tokio::test]
    async fn test_process_manifest_counts_malformed_lines_as_failures() {
        let manifest = Manifest::parse("only_one_token\n\nanother_bad_line\n");
        assert_eq!(manifest.total(), 3);

        let tmp = TempDir::new().unwrap();
        let engine = test_engine(2);
        let client = HttpClient::new();
        let stats = Arc::new(DownloadStats::new());

        engine
            .process_manifest(&manifest, &client, tmp.path(), &stats)
            .await
            .unwrap();

        // No network attempts happen for malformed lines
        assert_eq!(stats.succeeded(), 0);
        assert_eq!(stats.failed(), 3);
    }

    #[tokio::test]
    async fn test_process_manifest_cached_entries_skip_network() {
        // Pre-seed the target file; the bogus URL would fail if fetched
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("catA");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("catA_1.jpg"), b"existing jpeg").unwrap();

        let manifest = Manifest::parse("catA_1 http://256.256.256.256/never-fetched.jpg");
        let engine = test_engine(1);
        let client = HttpClient::new();
        let stats = Arc::new(DownloadStats::new());

        engine
            .process_manifest(&manifest, &client, tmp.path(), &stats)
            .await
            .unwrap();

        assert_eq!(stats.succeeded(), 1);
        assert_eq!(stats.failed(), 0);
        assert_eq!(
            std::fs::read(tmp.path().join("catA/catA_1.jpg")).unwrap(),
            b"existing jpeg"
        );
    }

    #[test]
    fn test_engine_error_display() {
        let error = EngineError::InvalidConcurrency { value: 0 };
        let msg = error.to_string();
        assert!(msg.contains("invalid concurrency"));
        assert!(msg.contains("0"));
        assert!(msg.contains("1")); // min
        assert!(msg.contains("100")); // max
    }

    #[test]
    fn test_default_concurrency_constant() {
        assert_eq!(DEFAULT_CONCURRENCY, 1);
    }
}
