//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use imagedl_core::{DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES};
use imagedl_core::download::DEFAULT_TIMEOUT_SECS;

/// Bulk-download images from a (name, URL) manifest.
///
/// Imagedl materializes an image dataset from a manifest file listing one
/// `name url` record per line, writing each image to
/// `<outdir>/<partition>/<name>.<ext>`. Entries already on disk are
/// skipped, so interrupted runs can simply be restarted.
#[derive(Parser, Debug)]
#[command(name = "imagedl")]
#[command(author, version, about)]
pub struct Args {
    /// Manifest file with one "name url" record per line
    pub list: PathBuf,

    /// Output directory (created if absent)
    pub outdir: PathBuf,

    /// Number of parallel downloads (1-100)
    #[arg(short = 'j', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jobs: u8,

    /// Timeout per image in seconds
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Maximum retries per image for transient failures (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub retry: u8,

    /// Sleep after each downloaded image, in seconds
    #[arg(short = 's', long, default_value_t = 1.0)]
    pub sleep: f64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
