//! Binary crate for the `ciel` terminal weather card.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Drawing the card in a terminal

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod term;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, never the alternate screen. RUST_LOG overrides
    // the default level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
