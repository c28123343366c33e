//! Imagedl Core Library
//!
//! This library provides the core functionality for the imagedl tool, which
//! materializes an image dataset from a manifest of (name, URL) records:
//! bounded-concurrency downloads, per-item retry with failure classification,
//! idempotent skip-if-exists caching, and live aggregate progress reporting.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`manifest`] - Manifest parsing into (name, URL) entries
//! - [`download`] - Concurrent download engine with retry support
//! - [`imgtype`] - Image kind detection from leading bytes
//! - [`progress`] - Periodic progress reporting alongside a running batch

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod imgtype;
pub mod manifest;
pub mod progress;

// Re-export commonly used types
pub use download::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DownloadEngine, DownloadError, DownloadStats,
    EngineError, FailureType, HttpClient, RetryDecision, RetryPolicy, classify_error,
};
pub use imgtype::ImageKind;
pub use manifest::{Entry, Manifest, ManifestError};
pub use progress::spawn_progress;
