//! linkenrich CLI: classify and summarize saved links in a Notion database.
//!
//! Finds records with an empty title or notes, asks a language model for a
//! title, category and short summary, and writes the result back.

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
