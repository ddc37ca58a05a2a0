//! Prospector CLI — harvest organization websites and score their relevance.
//!
//! Fetches one page per target under a concurrency cap, caches extracted
//! content, and scores each organization on the fixed four-axis taxonomy.

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
