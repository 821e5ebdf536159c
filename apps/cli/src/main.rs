//! billscope CLI: ingest U.S. congressional bills from GovInfo.
//!
//! Fetches bill XML, converts it to text and Markdown, computes linguistic
//! statistics and enriches each bill with LLM-generated analysis.

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
