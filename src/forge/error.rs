//! Error types for package synthesis operations.
//!
//! Provides the core [`Error`] enum, the module-wide [`Result`] alias, the
//! crate-local `bail!` macro, and context helper traits for attaching
//! human-readable detail to failures.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for forge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for package synthesis
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// IO errors carrying the action and path that failed
    #[error("failed {action} at {path}: {source}")]
    FsError {
        /// What was being attempted
        action: String,
        /// Path involved in the failure
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Package name is not a legal identifier
    #[error("invalid package name {0:?}: must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidPackageName(String),

    /// A build-only dependency was passed where only runtime dependencies are accepted
    #[error("dependency {0:?} is build-only and cannot appear in a project manifest")]
    BuildOnlyDependency(String),

    /// A declared product could not be located within an extracted release artifact
    #[error("product {product:?} not found in artifact for platform {platform}")]
    ProductNotFound {
        /// Variable name of the missing product
        product: String,
        /// Triplet of the platform whose artifact was searched
        platform: String,
    },

    /// A platform's release tarball is missing from a rebuild input directory
    #[error("no release tarball matching platform {platform} found in {dir}")]
    TarballNotFound {
        /// Triplet of the platform
        platform: String,
        /// Directory that was searched
        dir: PathBuf,
    },

    /// Registry query failure (unreachable, malformed index)
    #[error("registry error: {0}")]
    RegistryError(String),

    /// Repository provisioning failure
    #[error("repository error: {0}")]
    RepoError(String),

    /// A triplet string could not be parsed
    #[error("unrecognized platform triplet {0:?}")]
    InvalidTriplet(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Semantic version parse errors
    #[error("version error: {0}")]
    SemverError(#[from] semver::Error),

    /// Template rendering errors
    #[error("template error: {0}")]
    TemplateError(#[from] handlebars::RenderError),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML document parse errors (format-preserving editor)
    #[error("TOML document error: {0}")]
    TomlEditError(#[from] toml_edit::TomlError),

    /// URL parse errors
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Object file parse errors during soname capture
    #[error("binary parse error: {0}")]
    BinaryParseError(#[from] goblin::error::Error),

    /// Blocking task join errors
    #[error("task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    /// Generic errors with a formatted message
    #[error("{0}")]
    GenericError(String),
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::forge::Error::GenericError(format!($($arg)*)))
    };
}

/// Extension trait for attaching a message to an error result.
pub trait Context<T> {
    /// Wraps the error with a contextual message.
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

/// Extension trait for IO results that records the action and path involved.
pub trait ErrorExt<T> {
    /// Wraps an IO error with the action being performed and the path involved.
    fn fs_context(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::FsError {
            action: action.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}
