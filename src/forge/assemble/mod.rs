//! Package assembly orchestration.
//!
//! Drives one full generation run: pins the build revision, emits one
//! wrapper source per platform under `src/wrappers/`, maintains the artifact
//! registry, and writes the dispatch module, readme, license, and project
//! manifest. `from_scratch` mode deletes the generated source subdirectory
//! and the artifact registry first, so no stale per-platform sources survive
//! a product-set change; otherwise existing unrelated files are preserved.

mod artifacts;
mod dispatch;
mod license;
mod locate;
mod readme;
mod rebuild;
mod treehash;

pub use locate::locate_products;
pub use readme::Provenance;
pub use rebuild::{rebuild_meta, sha256_file};
pub use treehash::git_tree_hash;

use std::path::{Path, PathBuf};

use log::{debug, info};
use semver::Version;

use crate::forge::codegen::{EnvPolicy, generate_wrapper};
use crate::forge::error::{Error, ErrorExt, Result};
use crate::forge::identity::{valid_package_name, wrapper_name};
use crate::forge::platform::Platform;
use crate::forge::products::{BuildOutputMeta, Product};
use crate::forge::project::{Dependency, DependencyKind, RuntimeDependency, build_project};
use crate::forge::registry::Registry;
use crate::forge::version::resolve_build_version;

/// Policy knobs for one assembly run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Delete previously generated sources and the artifact registry before
    /// regenerating
    pub from_scratch: bool,
    /// Mark artifacts for lazy/deferred fetch
    pub lazy: bool,
    /// Minimum host version recorded in the manifest compat table
    pub julia_compat: String,
    /// Defaults for executable accessor environment adjustment
    pub env_policy: EnvPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            from_scratch: false,
            lazy: false,
            julia_compat: "1.0".to_string(),
            env_policy: EnvPolicy::default(),
        }
    }
}

/// Inputs to one assembly run.
#[derive(Debug, Clone)]
pub struct AssembleRequest {
    /// Source package name (without the wrapper suffix)
    pub src_name: String,
    /// Target version; revision-resolved unless it already carries build
    /// metadata
    pub version: Version,
    /// Upstream source URLs recorded in the readme
    pub sources: Vec<String>,
    /// Per-platform artifact bindings
    pub meta: BuildOutputMeta,
    /// Declared dependencies, runtime and build-only mixed
    pub dependencies: Vec<Dependency>,
    /// Download location prefix for artifact descriptors
    pub bin_prefix: String,
    /// Root of the emitted package tree
    pub package_dir: PathBuf,
    /// Policy knobs
    pub options: Options,
}

/// Assembles a complete wrapper package tree.
pub async fn assemble<R: Registry>(request: &AssembleRequest, registry: &mut R) -> Result<()> {
    if !valid_package_name(&request.src_name) {
        return Err(Error::InvalidPackageName(request.src_name.clone()));
    }

    let runtime_deps = runtime_dependencies(&request.dependencies)?;
    let version = resolve_build_version(registry, &request.src_name, &request.version).await?;

    let src_dir = request.package_dir.join("src");
    let wrappers_dir = src_dir.join("wrappers");
    let registry_path = request.package_dir.join("Artifacts.toml");

    if request.options.from_scratch {
        remove_if_present(&wrappers_dir).await?;
        remove_file_if_present(&registry_path).await?;
    }
    tokio::fs::create_dir_all(&wrappers_dir)
        .await
        .fs_context("creating wrappers directory", &wrappers_dir)?;

    let mut registry_doc = artifacts::load_registry(&registry_path).await?;
    for (platform, binding) in &request.meta.platforms {
        let source = generate_wrapper(
            &request.src_name,
            platform,
            binding,
            &runtime_deps,
            &request.options.env_policy,
        )?;
        let wrapper_path = wrappers_dir.join(platform.wrapper_filename());
        tokio::fs::write(&wrapper_path, source)
            .await
            .fs_context("writing wrapper source", &wrapper_path)?;
        debug!("wrote wrapper {}", wrapper_path.display());

        let url = format!(
            "{}/{}",
            request.bin_prefix.trim_end_matches('/'),
            binding.tarball_name
        );
        artifacts::register_binding(
            &mut registry_doc,
            &request.src_name,
            platform,
            binding,
            &url,
            request.options.lazy,
        );
    }
    artifacts::save_registry(&registry_path, &registry_doc).await?;

    let dispatch_source = dispatch::generate_dispatch(&request.src_name, &request.meta)?;
    let dispatch_path = src_dir.join(format!("{}.jl", wrapper_name(&request.src_name)));
    tokio::fs::write(&dispatch_path, dispatch_source)
        .await
        .fs_context("writing dispatch module", &dispatch_path)?;

    let readme_text = readme::build_readme(
        &request.src_name,
        &request.sources,
        &request.meta,
        &runtime_deps,
        Provenance::from_env().as_ref(),
    )?;
    let readme_path = request.package_dir.join("README.md");
    tokio::fs::write(&readme_path, readme_text)
        .await
        .fs_context("writing readme", &readme_path)?;

    license::write_license(&request.package_dir, None).await?;

    let manifest = build_project(
        &request.src_name,
        &version,
        &runtime_deps,
        &request.options.julia_compat,
    )?;
    let manifest_path = request.package_dir.join("Project.toml");
    tokio::fs::write(&manifest_path, manifest.to_string())
        .await
        .fs_context("writing project manifest", &manifest_path)?;

    info!(
        "assembled {} {version} with {} platform(s) at {}",
        wrapper_name(&request.src_name),
        request.meta.platforms.len(),
        request.package_dir.display()
    );
    Ok(())
}

/// Inputs to a rebuild-from-release-tarballs run.
#[derive(Debug, Clone)]
pub struct RebuildRequest {
    /// Source package name (without the wrapper suffix)
    pub src_name: String,
    /// Target version
    pub version: Version,
    /// Upstream source URLs recorded in the readme
    pub sources: Vec<String>,
    /// Platforms to rebuild, matched by triplet substring in tarball names
    pub platforms: Vec<Platform>,
    /// Declared products to locate in every platform's artifact
    pub products: Vec<Product>,
    /// Declared dependencies, runtime and build-only mixed
    pub dependencies: Vec<Dependency>,
    /// Download location prefix for artifact descriptors
    pub bin_prefix: String,
    /// Directory holding the release tarballs
    pub tarball_dir: PathBuf,
    /// Root of the emitted package tree
    pub package_dir: PathBuf,
    /// Policy knobs
    pub options: Options,
}

/// Rebuilds a full package tree from released artifacts.
pub async fn rebuild<R: Registry>(request: &RebuildRequest, registry: &mut R) -> Result<()> {
    let meta = rebuild_meta(&request.tarball_dir, &request.platforms, &request.products).await?;
    let assemble_request = AssembleRequest {
        src_name: request.src_name.clone(),
        version: request.version.clone(),
        sources: request.sources.clone(),
        meta,
        dependencies: request.dependencies.clone(),
        bin_prefix: request.bin_prefix.clone(),
        package_dir: request.package_dir.clone(),
        options: request.options.clone(),
    };
    assemble(&assemble_request, registry).await
}

/// Converts the runtime subset of a mixed dependency list.
///
/// Build-only dependencies are legitimate assembly inputs but must never
/// reach manifest construction; only the runtime ones are converted.
fn runtime_dependencies(deps: &[Dependency]) -> Result<Vec<RuntimeDependency>> {
    deps.iter()
        .filter(|d| d.kind == DependencyKind::Runtime)
        .cloned()
        .map(RuntimeDependency::try_from)
        .collect()
}

async fn remove_if_present(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing directory", dir),
    }
}

async fn remove_file_if_present(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing file", path),
    }
}
