//! Concurrent download engine with retry and caching support.
//!
//! This module provides the pieces of the download pipeline:
//! - [`HttpClient`] - single timed GET with failure classification
//! - [`RetryPolicy`] - bounded retry with a fixed inter-retry sleep
//! - [`store`] - partitioned target paths, cache check, and file writes
//! - [`DownloadEngine`] - bounded-concurrency dispatch over manifest entries

mod client;
mod engine;
mod error;
mod retry;
pub mod store;

pub use client::{DEFAULT_TIMEOUT_SECS, HttpClient};
pub use engine::{DEFAULT_CONCURRENCY, DownloadEngine, DownloadStats, EngineError};
pub use error::DownloadError;
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
