//! grafana-build CLI — build-orchestration front end for Grafana.
//!
//! Resolves a reproducible build context (source tree, version, build
//! identity) and dispatches it to containerized build/test/package pipelines.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
