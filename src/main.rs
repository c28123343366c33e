//! CLI entry point for the imagedl tool.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use imagedl_core::{
    DownloadEngine, DownloadStats, HttpClient, Manifest, RetryPolicy, progress::render_status,
    spawn_progress,
};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let manifest = Manifest::from_path(&args.list)
        .with_context(|| format!("cannot read manifest {}", args.list.display()))?;
    let total = manifest.total();

    // The output directory is created even when there is nothing to fetch
    std::fs::create_dir_all(&args.outdir)
        .with_context(|| format!("cannot create output directory {}", args.outdir.display()))?;

    if total == 0 {
        info!("manifest is empty, nothing to do");
        return Ok(());
    }

    info!(
        total,
        entries = manifest.entries.len(),
        malformed = manifest.malformed.len(),
        "loaded manifest"
    );

    let engine = DownloadEngine::new(
        usize::from(args.jobs),
        retry_policy_from(&args),
        Duration::from_secs(args.timeout),
        sleep_interval(args.sleep),
    )?;
    let client = HttpClient::new();
    let stats = Arc::new(DownloadStats::new());

    // Reporter runs alongside the batch. Verbose runs get appended log
    // lines instead of the overwriting status line; quiet runs take the
    // log path too, where the error-level filter drops the snapshots.
    let (progress_handle, stop) =
        spawn_progress(Arc::clone(&stats), total, args.verbose > 0 || args.quiet);

    let run_result = engine
        .process_manifest(&manifest, &client, &args.outdir, &stats)
        .await;

    stop.store(true, Ordering::SeqCst);
    if let Err(e) = progress_handle.await {
        warn!(error = %e, "progress reporter task panicked");
    }

    run_result?;

    // Per-item failures are counted, not fatal; the process still exits 0
    info!(
        "done: {}",
        render_status(stats.processed(), total, stats.succeeded())
    );

    Ok(())
}

/// Clamps the `-s/--sleep` value and converts it to a [`Duration`].
fn sleep_interval(secs: f64) -> Duration {
    Duration::from_secs_f64(secs.max(0.0))
}

/// Builds the retry policy from CLI arguments.
///
/// The `-s/--sleep` interval governs both the inter-retry sleep and the
/// post-download throttle, matching the single sleep knob of the original
/// tooling.
fn retry_policy_from(args: &Args) -> RetryPolicy {
    RetryPolicy::new(u32::from(args.retry), sleep_interval(args.sleep))
}
