//! Command line argument parsing and validation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

/// Binary-wrapper package synthesizer
#[derive(Parser, Debug)]
#[command(
    name = "jll_forge",
    version,
    about = "Generates redistributable wrapper packages from per-platform binary artifacts",
    long_about = "Generates, from a set of compiled binary artifacts for multiple platforms, a \
redistributable wrapper package: loader sources that locate and load the correct \
platform-specific binary at runtime, plus the accompanying manifest, readme, and license.

Usage:
  jll_forge rebuild --recipe jllforge.toml --tarballs ./products --output ./Zlib_jll --bin-prefix https://example.com/releases/v1.2.11
  jll_forge provision --owner JuliaBinaryWrappers --name Zlib_jll.jl --dir /tmp/Zlib_jll.jl"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild a full wrapper package from a directory of release tarballs
    Rebuild(RebuildArgs),
    /// Ensure a hosting-service repository exists and is checked out locally
    Provision(ProvisionArgs),
}

#[derive(Parser, Debug)]
pub struct RebuildArgs {
    /// Recipe file declaring name, version, platforms, products, and
    /// dependencies
    #[arg(short, long, value_name = "FILE", default_value = "jllforge.toml")]
    pub recipe: PathBuf,

    /// Directory holding one release tarball per platform, matched by
    /// triplet substring in the filename
    #[arg(short, long, value_name = "DIR")]
    pub tarballs: PathBuf,

    /// Root of the emitted package tree
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Download location prefix recorded in artifact descriptors
    #[arg(short, long, value_name = "URL")]
    pub bin_prefix: String,

    /// Registry index URL used to resolve the next build revision; without
    /// it the version is resolved against an empty registry view
    #[arg(long, value_name = "URL")]
    pub registry_url: Option<Url>,

    /// Preserve previously generated sources and registry entries instead
    /// of deleting them first
    #[arg(long)]
    pub incremental: bool,

    /// Mark artifacts for lazy/deferred fetch
    #[arg(long)]
    pub lazy: bool,

    /// Minimum host version recorded in the manifest compat table
    #[arg(long, value_name = "VERSION", default_value = "1.0")]
    pub julia_compat: String,
}

#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    /// Base URL of the hosting service API
    #[arg(long, value_name = "URL", default_value = "https://api.github.com/")]
    pub api_base: Url,

    /// Owning organization
    #[arg(long, value_name = "OWNER")]
    pub owner: String,

    /// Repository name
    #[arg(long, value_name = "NAME")]
    pub name: String,

    /// Clone URL; derived from owner/name on the default host when absent
    #[arg(long, value_name = "URL")]
    pub clone_url: Option<Url>,

    /// API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Local working copy directory
    #[arg(short, long, value_name = "DIR")]
    pub dir: PathBuf,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
