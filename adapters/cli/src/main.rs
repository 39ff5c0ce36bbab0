#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Plinth grid scenarios.

mod scenario;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

/// Builds a grid from a scenario file and prints the answers to its queries.
#[derive(Debug, Parser)]
#[command(name = "plinth", version)]
struct Cli {
    /// Scenario file in TOML format.
    scenario: PathBuf,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(short, long, default_value = "warn")]
    log: String,
}

/// Entry point for the Plinth command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let scenario = Scenario::load(&cli.scenario)?;
    let report = scenario.run()?;
    print!("{report}");
    Ok(())
}
