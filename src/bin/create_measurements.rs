use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use onebrc::generate::{Generator, builtin_stations, parse_stations};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Writes synthetic `station;temperature` lines to stdout.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of records, underscores allowed (e.g. 1_000_000)
    #[arg(value_parser = parse_count)]
    count: u64,

    /// `name;mean` file to draw stations from instead of the built-in list
    #[arg(long, value_name = "FILE")]
    stations: Option<PathBuf>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_count(s: &str) -> Result<u64, std::num::ParseIntError> {
    s.replace('_', "").parse()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let stations = match &args.stations {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            parse_stations(&text).with_context(|| format!("could not parse {}", path.display()))?
        }
        None => builtin_stations(),
    };

    let mut generator = Generator::new(stations, args.seed)?;

    info!(
        count = args.count,
        stations = generator.stations().len(),
        "generating measurements"
    );

    generator
        .write_records(args.count, io::stdout().lock())
        .context("failed to write measurements")?;

    Ok(())
}
