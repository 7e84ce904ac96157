#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a tower defence scenario headlessly.

mod runner;
mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use runner::RunOptions;
use scenario::Scenario;

#[derive(Debug, Parser)]
#[command(
    name = "tower-defence",
    about = "Runs a tower defence scenario without rendering"
)]
struct Cli {
    /// Scenario file in TOML; the built-in scenario is used when omitted.
    #[arg(short, long)]
    scenario: Option<PathBuf>,
    /// Number of ticks to simulate, overriding the scenario.
    #[arg(short, long)]
    ticks: Option<u64>,
    /// Length of a tick in milliseconds, overriding the scenario.
    #[arg(long)]
    dt_ms: Option<u64>,
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the tower defence command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let scenario = match &cli.scenario {
        Some(path) => Scenario::from_file(path)?,
        None => Scenario::builtin()?,
    };
    let options = RunOptions {
        ticks: cli.ticks.unwrap_or_else(|| scenario.ticks()),
        dt: cli.dt_ms.map_or_else(|| scenario.dt(), Duration::from_millis),
    };

    let summary = runner::run(&scenario, options)?;
    print!("{summary}");
    Ok(())
}
