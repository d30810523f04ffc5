//! Package synthesis engine.
//!
//! Turns a set of per-platform binary artifacts into a redistributable
//! wrapper package: deterministic identifiers, build revision resolution,
//! per-platform loader source generation, and assembly of the package tree
//! with its manifest, readme, license, and artifact registry.

pub mod assemble;
pub mod codegen;
pub mod error;
pub mod identity;
pub mod platform;
pub mod products;
pub mod project;
pub mod registry;
pub mod repo;
pub mod version;

// Re-export commonly used types
pub use assemble::{AssembleRequest, Options, RebuildRequest, assemble, rebuild};
pub use codegen::{EnvPolicy, generate_wrapper};
pub use error::{Context, Error, ErrorExt, Result};
pub use identity::{derive_identifier, wrapper_identifier, wrapper_name};
pub use platform::{Arch, Libc, Os, Platform, Triplet};
pub use products::{
    ArtifactBinding, BuildOutputMeta, ExecutableProduct, FileProduct, FrameworkProduct,
    LibraryProduct, LocatedProduct, Product,
};
pub use project::{Constraint, Dependency, DependencyKind, RuntimeDependency, build_project};
pub use registry::{HttpRegistry, Registry, StaticRegistry};
pub use version::resolve_build_version;
