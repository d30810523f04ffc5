//! jll-forge - wrapper package synthesizer for per-platform binary releases.
//!
//! This binary turns a recipe plus a directory of release tarballs into a
//! complete wrapper package tree, and provisions the hosting-service
//! repository the tree is published to.

mod cli;
mod error;
mod forge;
mod recipe;

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
