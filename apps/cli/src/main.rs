//! entidades CLI — concurrent harvester for the OSCE entity directory.
//!
//! Splits the listing's page range across a pool of browser-backed workers
//! and drains their records into a single CSV.

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
