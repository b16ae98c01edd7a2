//! academiccv CLI: render an academic CV from a local record store.
//!
//! Imports CV records, enriches coauthors through Scopus, and renders the
//! records into a LaTeX document typeset with xelatex.

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
