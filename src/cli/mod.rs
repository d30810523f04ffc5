//! Command line interface for the package synthesizer.

mod args;
pub mod commands;

pub use args::{Args, Command};

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    match &args.command {
        Command::Rebuild(rebuild) => commands::rebuild::run(rebuild).await,
        Command::Provision(provision) => commands::provision::run(provision).await,
    }
}
