//! Recipe file parsing.
//!
//! A recipe (`jllforge.toml`) declares everything a rebuild needs that is
//! not derivable from the release tarballs themselves: the package name and
//! version, the target platforms, the declared products, the dependency
//! list, and the upstream source URLs recorded in the readme.

use std::path::Path;

use semver::{Version, VersionReq};
use serde::Deserialize;

use crate::forge::error::{ErrorExt, Result};
use crate::forge::platform::Platform;
use crate::forge::products::{
    ExecutableProduct, FileProduct, FrameworkProduct, LibraryProduct, Product,
};
use crate::forge::project::{Constraint, Dependency, DependencyKind};

/// Parsed recipe file.
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    /// Source package name, without the wrapper suffix
    pub name: String,
    /// Target version
    pub version: Version,
    /// Target platform triplets; the legacy `arm-` spelling is accepted
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
    #[serde(default)]
    pub products: Vec<ProductEntry>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

/// One upstream source record.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub url: String,
}

/// One declared product, tagged by kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProductEntry {
    Library {
        variable: String,
        names: Vec<String>,
    },
    Executable {
        variable: String,
        name: String,
    },
    File {
        variable: String,
        path: String,
    },
    Framework {
        variable: String,
        name: String,
    },
}

/// One declared dependency.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyEntry {
    /// Full package name, e.g. `Zlib_jll`
    pub name: String,
    /// Version constraint in requirement syntax; absent means any version
    #[serde(default)]
    pub compat: Option<String>,
    /// Build-only dependencies never appear in the emitted manifest
    #[serde(default)]
    pub build_only: bool,
}

impl Recipe {
    /// Reads and parses a recipe file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading recipe", path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Declared platforms, parsed and sorted by triplet.
    pub fn platforms(&self) -> Result<Vec<Platform>> {
        let mut platforms = self
            .platforms
            .iter()
            .map(|t| t.parse())
            .collect::<Result<Vec<Platform>>>()?;
        platforms.sort();
        platforms.dedup();
        Ok(platforms)
    }

    /// Declared products as the typed product model.
    pub fn products(&self) -> Vec<Product> {
        self.products
            .iter()
            .map(|entry| match entry.clone() {
                ProductEntry::Library { variable, names } => Product::Library(LibraryProduct {
                    var_name: variable,
                    names,
                }),
                ProductEntry::Executable { variable, name } => {
                    Product::Executable(ExecutableProduct {
                        var_name: variable,
                        name,
                    })
                }
                ProductEntry::File { variable, path } => Product::File(FileProduct {
                    var_name: variable,
                    path,
                }),
                ProductEntry::Framework { variable, name } => {
                    Product::Framework(FrameworkProduct {
                        var_name: variable,
                        name,
                    })
                }
            })
            .collect()
    }

    /// Declared dependencies as the typed dependency model.
    pub fn dependencies(&self) -> Result<Vec<Dependency>> {
        self.dependencies
            .iter()
            .map(|entry| {
                let constraint = match &entry.compat {
                    None => Constraint::Any,
                    Some(req) => Constraint::Range(VersionReq::parse(req)?),
                };
                Ok(Dependency {
                    name: entry.name.clone(),
                    constraint,
                    kind: if entry.build_only {
                        DependencyKind::Build
                    } else {
                        DependencyKind::Runtime
                    },
                })
            })
            .collect()
    }

    /// Upstream source URLs.
    pub fn source_urls(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.url.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: &str = r#"
name = "FFMPEG"
version = "4.1.0"
platforms = ["x86_64-linux-gnu", "arm-linux-gnueabihf"]

[[sources]]
url = "https://ffmpeg.org/releases/ffmpeg-4.1.tar.bz2"

[[products]]
kind = "library"
variable = "libavcodec"
names = ["libavcodec"]

[[products]]
kind = "executable"
variable = "ffmpeg"
name = "ffmpeg"

[[products]]
kind = "file"
variable = "presets"
path = "share/ffmpeg/presets.dat"

[[products]]
kind = "framework"
variable = "av_framework"
name = "AVFoundationShim"

[[dependencies]]
name = "Zlib_jll"
compat = "=1.2.11"

[[dependencies]]
name = "CMake_jll"
build_only = true
"#;

    #[test]
    fn parses_all_product_variants_and_dependency_kinds() {
        let recipe: Recipe = toml::from_str(RECIPE).unwrap();
        assert_eq!(recipe.name, "FFMPEG");
        assert_eq!(recipe.version.to_string(), "4.1.0");

        let platforms = recipe.platforms().unwrap();
        assert_eq!(platforms.len(), 2);
        assert_eq!(platforms[0].triplet(), "armv7l-linux-gnueabihf");

        let products = recipe.products();
        assert_eq!(products.len(), 4);
        assert!(matches!(&products[0], Product::Library(l) if l.var_name == "libavcodec"));
        assert!(matches!(&products[3], Product::Framework(f) if f.name == "AVFoundationShim"));

        let deps = recipe.dependencies().unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].kind, DependencyKind::Runtime);
        assert!(matches!(&deps[0].constraint, Constraint::Range(_)));
        assert_eq!(deps[1].kind, DependencyKind::Build);
        assert_eq!(recipe.source_urls().len(), 1);
    }
}
