//! Aggregates a `key;value` file into sorted `key=min/mean/max` lines.
//!
//! Usage: `onebrc <input> <output> <workers>`
//!
//! On success the only thing written to stdout is the elapsed wall-clock
//! time, `<seconds> seconds`. Diagnostics go to stderr (`RUST_LOG`).

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use onebrc::{Aggregator, process_file};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file of `key;value` lines
    input: PathBuf,

    /// Where to write the sorted aggregates
    output: PathBuf,

    /// Number of worker threads (at least 1)
    workers: NonZeroUsize,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging();
    debug!(?args, "starting");

    let aggregator = Aggregator::new(args.workers);

    let start = Instant::now();
    let summary = process_file(&args.input, &args.output, &aggregator).with_context(|| {
        format!(
            "failed to aggregate {} into {}",
            args.input.display(),
            args.output.display()
        )
    })?;
    let elapsed = start.elapsed();

    debug!(keys = summary.keys, records = summary.records, ?elapsed, "done");

    println!("{:.9} seconds", elapsed.as_secs_f64());

    Ok(())
}
