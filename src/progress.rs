//! Live aggregate progress reporting for a running batch.
//!
//! A single reporter task runs alongside the dispatcher, snapshots the
//! shared counters once per second, and renders one status line. In the
//! default mode the line overwrites itself in place; in verbose mode each
//! snapshot is appended as a log line so the run leaves an inspectable
//! trail.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::download::DownloadStats;

/// Snapshot cadence for the reporter.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Renders one status line from a counter snapshot.
///
/// Format: `{done} / {total} ({pct}%) done, {ok} / {done} ({pct}%) succeeded`.
#[must_use]
pub fn render_status(done: usize, total: usize, succeeded: usize) -> String {
    #[allow(clippy::cast_precision_loss)]
    let pct_done = if total == 0 {
        100.0
    } else {
        done as f64 * 100.0 / total as f64
    };
    #[allow(clippy::cast_precision_loss)]
    let pct_ok = if done == 0 {
        0.0
    } else {
        succeeded as f64 * 100.0 / done as f64
    };

    format!("{done} / {total} ({pct_done:.1}%) done, {succeeded} / {done} ({pct_ok:.1}%) succeeded")
}

/// Spawns the progress reporter task.
///
/// Returns (handle, stop) so the caller can flip the stop flag once the
/// dispatcher returns and then await the handle. The reporter only reads
/// the counters; it tolerates snapshots that are a beat behind the workers.
#[must_use]
pub fn spawn_progress(
    stats: Arc<DownloadStats>,
    total: usize,
    verbose: bool,
) -> (tokio::task::JoinHandle<()>, Arc<AtomicBool>) {
    let stop = Arc::new(AtomicBool::new(false));
    let handle = if verbose {
        spawn_log_reporter(stats, total, Arc::clone(&stop))
    } else {
        spawn_line_reporter(stats, total, Arc::clone(&stop))
    };
    (handle, stop)
}

/// Single overwriting status line on stderr.
fn spawn_line_reporter(
    stats: Arc<DownloadStats>,
    total: usize,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let line = ProgressBar::new_spinner();
        line.set_style(
            ProgressStyle::with_template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        while !stop.load(Ordering::SeqCst) {
            line.set_message(render_status(stats.processed(), total, stats.succeeded()));
            tokio::time::sleep(REPORT_INTERVAL).await;
        }

        line.finish_and_clear();
    })
}

/// Appended log line per snapshot, for verbose runs and non-tty logs.
fn spawn_log_reporter(
    stats: Arc<DownloadStats>,
    total: usize,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while !stop.load(Ordering::SeqCst) {
            info!("{}", render_status(stats.processed(), total, stats.succeeded()));
            tokio::time::sleep(REPORT_INTERVAL).await;
        }
    })
}
