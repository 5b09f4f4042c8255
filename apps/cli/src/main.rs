//! leadpipe CLI: lead sourcing and AI enrichment for creator outreach.
//!
//! Imports prospects from the lead-sourcing service into the leads table
//! and fills in inferred names, niches and personalised openers.

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
