//! skillscope CLI: skills.sh catalog snapshot and ecosystem dashboard.
//!
//! Fetches the full skill catalog through a fixed query plan, deduplicates
//! and aggregates it by publisher, and renders a self-contained dashboard.

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
