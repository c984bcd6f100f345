#![forbid(unsafe_code)]
mod cli;
mod commands;

use crate::cli::Cli;
use clap::Parser;
use color_eyre::eyre;
use petmarket::utils::{initialize_logging, initialize_panic_handler};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    initialize_logging()?;
    initialize_panic_handler()?;
    let args = Cli::parse();
    let result = commands::run(args.command).await;
    if let Err(e) = &result {
        tracing::error!("Command failed: {}", e);
    }
    result
}
