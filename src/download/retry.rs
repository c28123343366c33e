//! Retry logic for transient download failures.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types for
//! classifying download errors and determining retry behavior.
//!
//! # Overview
//!
//! When a fetch fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - failures that may succeed on retry
//!   (5xx statuses, resolution/connection failures, timeouts, other
//!   transport errors)
//! - [`FailureType::Permanent`] - failures that won't succeed regardless of
//!   retries (non-5xx HTTP statuses, invalid URLs, unrecognized content,
//!   local IO errors)
//!
//! The [`RetryPolicy`] then decides whether to retry based on failure type
//! and how many attempts have already failed. The inter-retry delay is a
//! fixed configured interval; there is no backoff ramp and no sleep before
//! the very first attempt.

use std::time::Duration;

use tracing::{debug, instrument};

use super::DownloadError;

/// Default maximum retry attempts after the initial attempt.
///
/// The original tooling shipped two different defaults (2 on the command
/// line, 10 in the library). We use 2 uniformly.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default sleep between retry attempts (1 second).
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Classification of download failure types.
///
/// Used to determine whether a failed fetch should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: 5xx server errors, DNS/connection failures, timeouts.
    Transient,

    /// Permanent failure that won't succeed regardless of retries.
    ///
    /// Examples: 404 Not Found, invalid URL, unrecognized image bytes,
    /// local file system errors.
    Permanent,
}

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the fetch after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
    },

    /// Do not retry; the last error becomes the item's terminal failure.
    GiveUp {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with a fixed inter-retry delay.
///
/// `max_retries` counts retries only: an item makes at most
/// `max_retries + 1` fetch attempts. Permanent failures abort the attempt
/// sequence immediately without consuming the budget.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    max_retries: u32,

    /// Fixed delay before each retry.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Maximum retries after the initial attempt (0 means
    ///   a single attempt)
    /// * `delay` - Fixed sleep before each retry
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Creates a policy with a custom retry count and the default delay.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Returns the configured maximum retry count.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the fixed inter-retry delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Determines whether to retry after a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `failure_type` - Classification of the failure
    /// * `failed_attempts` - How many attempts have failed so far (1 after
    ///   the initial attempt fails)
    #[instrument(skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, failure_type: FailureType, failed_attempts: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::GiveUp {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if failed_attempts > self.max_retries {
            debug!(
                failed_attempts,
                max_retries = self.max_retries,
                "retry budget exhausted"
            );
            return RetryDecision::GiveUp {
                reason: format!("retry budget ({}) exhausted", self.max_retries),
            };
        }

        debug!(
            failed_attempts,
            delay_ms = self.delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry { delay: self.delay }
    }
}

/// Classifies a download error into a failure type for retry decisions.
///
/// | Error | Type | Rationale |
/// |-------|------|-----------|
/// | HTTP 5xx | Transient | Server error - may be temporary |
/// | HTTP non-5xx | Permanent | Client error - won't succeed on retry |
/// | Resolve | Transient | DNS/connect failures often recover |
/// | Timeout | Transient | Network may recover |
/// | Network | Transient | Other transport errors may recover |
/// | InvalidUrl | Permanent | Won't succeed |
/// | UnknownImageType | Permanent | Content won't change on refetch |
/// | Io | Permanent | Local file system issue |
#[instrument]
pub fn classify_error(error: &DownloadError) -> FailureType {
    match error {
        DownloadError::HttpStatus { status, .. } => {
            if (500..600).contains(status) {
                FailureType::Transient
            } else {
                FailureType::Permanent
            }
        }

        DownloadError::Resolve { .. }
        | DownloadError::Timeout { .. }
        | DownloadError::Network { .. } => FailureType::Transient,

        DownloadError::InvalidUrl { .. }
        | DownloadError::UnknownImageType { .. }
        | DownloadError::Io { .. } => FailureType::Permanent,
    }
}
