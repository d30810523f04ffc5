//! Typed descriptions of locatable artifacts inside a binary archive.
//!
//! A [`Product`] is a named thing the generated package promises to expose:
//! a shared library, an executable, a plain file, or a macOS framework. The
//! variant determines what global state the wrapper generator declares for
//! it, what its initialization does, and which search-path list it feeds.
//! The variant set is closed; every consumer matches exhaustively.

use std::collections::BTreeMap;

use crate::forge::platform::Platform;

/// A shared library product.
///
/// `names` are the candidate base names (without extension or version
/// suffix) used to locate the library inside an unpacked artifact tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryProduct {
    /// Variable name exposed by the generated wrapper
    pub var_name: String,
    /// Candidate base names, e.g. `["libz"]`
    pub names: Vec<String>,
}

/// An executable product, located under the artifact's `bin` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableProduct {
    /// Variable name exposed by the generated wrapper
    pub var_name: String,
    /// Executable base name, without any `.exe` suffix
    pub name: String,
}

/// A plain file product at a fixed relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProduct {
    /// Variable name exposed by the generated wrapper
    pub var_name: String,
    /// Relative path within the artifact tree
    pub path: String,
}

/// A macOS framework product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkProduct {
    /// Variable name exposed by the generated wrapper
    pub var_name: String,
    /// Framework name, without the `.framework` suffix
    pub name: String,
}

/// Closed sum over the product variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Product {
    Library(LibraryProduct),
    Executable(ExecutableProduct),
    File(FileProduct),
    Framework(FrameworkProduct),
}

impl Product {
    /// Variable name exposed by the generated wrapper; also the sort key for
    /// all deterministic output ordering.
    pub fn var_name(&self) -> &str {
        match self {
            Product::Library(p) => &p.var_name,
            Product::Executable(p) => &p.var_name,
            Product::File(p) => &p.var_name,
            Product::Framework(p) => &p.var_name,
        }
    }

    /// Short human-readable kind name for readmes.
    pub fn kind(&self) -> &'static str {
        match self {
            Product::Library(_) => "LibraryProduct",
            Product::Executable(_) => "ExecutableProduct",
            Product::File(_) => "FileProduct",
            Product::Framework(_) => "FrameworkProduct",
        }
    }

}

/// A product together with its discovered location inside one platform's
/// unpacked artifact tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedProduct {
    /// The declared product
    pub product: Product,
    /// Relative path within the artifact tree, `/`-separated
    pub path: String,
    /// Soname (or install name) captured at discovery time; present for
    /// library and framework products only
    pub soname: Option<String>,
}

impl LocatedProduct {
    /// Path split into segments for compile-time-constant emission.
    pub fn split_path(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// One platform's artifact binding: the tarball reference, its hashes, and
/// the discovered product map keyed by variable name.
#[derive(Debug, Clone)]
pub struct ArtifactBinding {
    /// Filename of the release tarball
    pub tarball_name: String,
    /// SHA-256 of the tarball, hex encoded
    pub tarball_sha256: String,
    /// Content-addressed tree hash of the unpacked artifact, hex encoded
    pub tree_hash: String,
    /// Discovered products keyed by variable name (sorted)
    pub products: BTreeMap<String, LocatedProduct>,
}

/// The central input to code generation: per-platform artifact bindings.
///
/// Entries may legitimately differ in product set between platforms.
#[derive(Debug, Clone, Default)]
pub struct BuildOutputMeta {
    /// Bindings keyed by platform, sorted by triplet
    pub platforms: BTreeMap<Platform, ArtifactBinding>,
}

impl BuildOutputMeta {
    /// Whether every bound platform is the platform-independent sentinel.
    pub fn all_platform_independent(&self) -> bool {
        self.platforms.keys().all(|p| *p == Platform::Any)
    }

    /// Union of all product variable names across platforms, sorted.
    pub fn product_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .platforms
            .values()
            .flat_map(|b| b.products.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
