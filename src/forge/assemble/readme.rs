//! Readme generation.
//!
//! Enumerates sources, platforms, dependencies, and products in sorted order
//! so repeated generation from identical inputs is byte-identical. When the
//! run happens inside a recognized CI environment, a provenance link to the
//! build script is appended; outside CI the link is simply omitted.

use std::collections::BTreeMap;

use handlebars::Handlebars;

use crate::forge::codegen::README_TEMPLATE;
use crate::forge::error::Result;
use crate::forge::identity::wrapper_name;
use crate::forge::products::BuildOutputMeta;
use crate::forge::project::RuntimeDependency;

/// Provenance of the build, derived from CI environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Repository URL of the build scripts
    pub repository_uri: String,
    /// Commit hash of the build
    pub source_version: String,
    /// Path of the build project within the repository
    pub project_path: String,
}

impl Provenance {
    /// Reads provenance from the environment, when running in a recognized
    /// CI environment (`CI=true` plus the build-variable triple).
    pub fn from_env() -> Option<Self> {
        if std::env::var("CI").ok()? != "true" {
            return None;
        }
        Some(Provenance {
            repository_uri: std::env::var("BUILD_REPOSITORY_URI").ok()?,
            source_version: std::env::var("BUILD_SOURCEVERSION").ok()?,
            project_path: std::env::var("BUILD_PROJECT_PATH").ok()?,
        })
    }
}

/// Renders the readme for a wrapper package.
pub fn build_readme(
    src_name: &str,
    sources: &[String],
    meta: &BuildOutputMeta,
    deps: &[RuntimeDependency],
    provenance: Option<&Provenance>,
) -> Result<String> {
    let mut source_list = String::new();
    let mut sorted_sources: Vec<&String> = sources.iter().collect();
    sorted_sources.sort();
    for source in sorted_sources {
        source_list.push_str(&format!("* {source}\n"));
    }

    let mut platform_list = String::new();
    for platform in meta.platforms.keys() {
        platform_list.push_str(&format!(
            "* `{}` ({})\n",
            platform.triplet(),
            platform.description()
        ));
    }

    let dependency_list = if deps.is_empty() {
        "This package has no dependencies beyond the host runtime.\n".to_string()
    } else {
        let mut names: Vec<&str> = deps.iter().map(RuntimeDependency::name).collect();
        names.sort_unstable();
        let mut list = String::from("This package depends on:\n\n");
        for name in names {
            list.push_str(&format!("* `{name}`\n"));
        }
        list
    };

    let mut product_list = String::new();
    for platform_binding in meta.platforms.values() {
        for (name, located) in &platform_binding.products {
            let line = format!("* `{name}` ({})\n", located.product.kind());
            if !product_list.contains(&line) {
                product_list.push_str(&line);
            }
        }
    }

    let provenance_text = provenance
        .map(|p| {
            format!(
                "\n\nThe originating build script can be found at\n[`{uri}/blob/{commit}/{path}`]({uri}/blob/{commit}/{path}).",
                uri = p.repository_uri,
                commit = p.source_version,
                path = p.project_path,
            )
        })
        .unwrap_or_default();

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let mut data: BTreeMap<&str, String> = BTreeMap::new();
    data.insert("package_name", wrapper_name(src_name));
    data.insert("provenance", provenance_text);
    data.insert("sources", source_list);
    data.insert("platforms", platform_list);
    data.insert("dependencies", dependency_list);
    data.insert("products", product_list);

    Ok(handlebars.render_template(README_TEMPLATE, &data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::products::{ArtifactBinding, ExecutableProduct, LocatedProduct, Product};
    use crate::forge::project::Dependency;

    fn meta() -> BuildOutputMeta {
        let mut meta = BuildOutputMeta::default();
        for triplet in ["x86_64-linux-gnu", "x86_64-apple-darwin14"] {
            let mut products = std::collections::BTreeMap::new();
            products.insert(
                "x264".to_string(),
                LocatedProduct {
                    product: Product::Executable(ExecutableProduct {
                        var_name: "x264".into(),
                        name: "x264".into(),
                    }),
                    path: "bin/x264".into(),
                    soname: None,
                },
            );
            meta.platforms.insert(
                triplet.parse().unwrap(),
                ArtifactBinding {
                    tarball_name: format!("X264.v1.0.0.{triplet}.tar.gz"),
                    tarball_sha256: String::new(),
                    tree_hash: String::new(),
                    products,
                },
            );
        }
        meta
    }

    #[test]
    fn lists_platforms_products_and_deps_sorted() {
        let deps: Vec<RuntimeDependency> = [
            Dependency::runtime("Zlib_jll"),
            Dependency::runtime("Bzip2_jll"),
        ]
        .into_iter()
        .map(|d| RuntimeDependency::try_from(d).unwrap())
        .collect();
        let readme = build_readme(
            "X264",
            &["https://example.com/x264.tar.bz2".to_string()],
            &meta(),
            &deps,
            None,
        )
        .unwrap();
        assert!(readme.starts_with("# X264_jll"));
        assert!(readme.contains("* `x86_64-apple-darwin14` (macOS x86_64)"));
        assert!(readme.contains("* `x86_64-linux-gnu` (Linux x86_64 {libc=glibc})"));
        let bzip = readme.find("`Bzip2_jll`").unwrap();
        let zlib = readme.find("`Zlib_jll`").unwrap();
        assert!(bzip < zlib);
        assert_eq!(readme.matches("`x264` (ExecutableProduct)").count(), 1);
        assert!(!readme.contains("originating build script"));
    }

    #[test]
    fn provenance_link_appended_in_ci() {
        let provenance = Provenance {
            repository_uri: "https://example.com/builder".into(),
            source_version: "abc123".into(),
            project_path: "X/build_tarballs.jl".into(),
        };
        let readme = build_readme("X264", &[], &meta(), &[], Some(&provenance)).unwrap();
        assert!(
            readme.contains("https://example.com/builder/blob/abc123/X/build_tarballs.jl")
        );
    }
}
