//! Binary-wrapper package synthesis.
//!
//! This library generates, from a set of compiled binary artifacts for
//! multiple platforms, a redistributable wrapper package:
//! - deterministic package identifiers and build revision resolution
//! - per-platform loader sources with a load-time dispatch module
//! - the dependency/version manifest, artifact registry, readme, and license
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod forge;
pub mod recipe;

// Re-export commonly used types
pub use error::{CliError, ForgeError, Result};
