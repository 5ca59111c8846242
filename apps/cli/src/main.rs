//! seoscribe CLI — rewrite copy for SEO, grounded on a website's own content.
//!
//! Fetches a page, keeps its text as knowledge, and asks an LLM to rewrite
//! user-supplied text with that knowledge in the prompt.

mod commands;
mod frontend;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
