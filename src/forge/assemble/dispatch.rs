//! Top-level dispatch module generation.
//!
//! The dispatch unit is the package's entry-point source: it declares the
//! inter-package PATH/LIBPATH lists, then either includes the single
//! platform-independent wrapper directly, or selects among the per-platform
//! wrappers at load time by intersecting the platforms recorded in the
//! artifact registry with the wrapper files present on disk. A package with
//! no wrapper for the host platform loads as an inert module, not an error.

use std::collections::BTreeMap;

use handlebars::Handlebars;

use crate::forge::codegen::{
    DISPATCH_ANY_TEMPLATE, DISPATCH_SELECT_TEMPLATE, DISPATCH_TEMPLATE, export_line,
};
use crate::forge::error::Result;
use crate::forge::identity::{wrapper_identifier, wrapper_name};
use crate::forge::products::BuildOutputMeta;

/// Generates the dispatch module source for a wrapper package.
pub fn generate_dispatch(src_name: &str, meta: &BuildOutputMeta) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let selection = if meta.all_platform_independent() {
        DISPATCH_ANY_TEMPLATE.to_string()
    } else {
        let mut data: BTreeMap<&str, String> = BTreeMap::new();
        data.insert("artifact_name", src_name.to_string());
        data.insert("uuid", wrapper_identifier(src_name).to_string());
        handlebars.render_template(DISPATCH_SELECT_TEMPLATE, &data)?
    };

    let names = meta.product_names();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut data: BTreeMap<&str, String> = BTreeMap::new();
    data.insert("package_name", wrapper_name(src_name));
    data.insert("export_line", export_line(&name_refs));
    data.insert("selection", selection);
    Ok(handlebars.render_template(DISPATCH_TEMPLATE, &data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::platform::Platform;
    use crate::forge::products::{ArtifactBinding, FileProduct, LocatedProduct, Product};
    use std::collections::BTreeMap;

    fn binding(var: &str) -> ArtifactBinding {
        let mut products = BTreeMap::new();
        products.insert(
            var.to_string(),
            LocatedProduct {
                product: Product::File(FileProduct {
                    var_name: var.into(),
                    path: "data".into(),
                }),
                path: "data".into(),
                soname: None,
            },
        );
        ArtifactBinding {
            tarball_name: "t.tar.gz".into(),
            tarball_sha256: String::new(),
            tree_hash: String::new(),
            products,
        }
    }

    #[test]
    fn multi_platform_dispatch_selects_at_load_time() {
        let mut meta = BuildOutputMeta::default();
        meta.platforms
            .insert("x86_64-linux-gnu".parse().unwrap(), binding("data_file"));
        meta.platforms
            .insert("x86_64-apple-darwin14".parse().unwrap(), binding("data_file"));
        let source = generate_dispatch("Zlib", &meta).unwrap();
        assert!(source.starts_with("module Zlib_jll"));
        assert!(source.contains("export data_file"));
        assert!(source.contains("pkg_uuid=UUID(\"83775a58-1f1d-513f-b197-d71354ab007a\")"));
        assert!(source.contains("select_platform"));
        // Legacy arm spelling substituted in both the on-disk filter and the final lookup
        assert_eq!(source.matches("replace(").count(), 2);
        assert!(source.contains("\"arm-\" => \"armv7l-\""));
        assert!(source.contains("best_platform === nothing"));
    }

    #[test]
    fn empty_product_set_emits_no_export_statement() {
        let mut meta = BuildOutputMeta::default();
        meta.platforms.insert(
            "x86_64-linux-gnu".parse().unwrap(),
            ArtifactBinding {
                tarball_name: "t.tar.gz".into(),
                tarball_sha256: String::new(),
                tree_hash: String::new(),
                products: BTreeMap::new(),
            },
        );
        let source = generate_dispatch("Bare", &meta).unwrap();
        assert!(!source.contains("export"));
        assert!(source.contains("const PATH_list = String[]"));
    }

    #[test]
    fn platform_independent_dispatch_includes_directly() {
        let mut meta = BuildOutputMeta::default();
        meta.platforms.insert(Platform::Any, binding("data_file"));
        let source = generate_dispatch("FontData", &meta).unwrap();
        assert!(source.contains("include(joinpath(@__DIR__, \"wrappers\", \"any.jl\"))"));
        assert!(!source.contains("select_platform"));
    }
}
