//! Per-platform wrapper source generation.
//!
//! Emits, for one platform, a self-contained source unit that declares the
//! PATH/LIBPATH globals, one global block per product, and an `__init__`
//! routine that resolves the artifact root, computes product paths, performs
//! per-variant side effects, and finalizes the search-path lists. Output is
//! byte-identical across repeated invocations of identical inputs: products
//! and dependencies are iterated in sorted order throughout.

mod template;

pub use template::{
    DISPATCH_ANY_TEMPLATE, DISPATCH_SELECT_TEMPLATE, DISPATCH_TEMPLATE, README_TEMPLATE,
};

use std::collections::BTreeMap;

use handlebars::Handlebars;

use crate::forge::error::Result;
use crate::forge::identity::wrapper_name;
use crate::forge::platform::{Os, Platform};
use crate::forge::products::{ArtifactBinding, LocatedProduct, Product};
use crate::forge::project::RuntimeDependency;

/// Whether executable accessors adjust PATH/LIBPATH by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvPolicy {
    pub adjust_path: bool,
    pub adjust_libpath: bool,
}

impl Default for EnvPolicy {
    fn default() -> Self {
        EnvPolicy {
            adjust_path: true,
            adjust_libpath: true,
        }
    }
}

/// OS-specific environment conventions for library search paths.
struct OsEnv {
    libpath_env: &'static str,
    libpath_default: &'static str,
    path_sep: char,
}

fn os_env(platform: &Platform) -> OsEnv {
    match platform.os() {
        Some(Os::Windows) => OsEnv {
            libpath_env: "PATH",
            libpath_default: "",
            path_sep: ';',
        },
        Some(Os::Macos) => OsEnv {
            libpath_env: "DYLD_FALLBACK_LIBRARY_PATH",
            libpath_default: "~/lib:/usr/local/lib:/lib:/usr/lib",
            path_sep: ':',
        },
        // Generic POSIX default, also used for platform-independent artifacts
        _ => OsEnv {
            libpath_env: "LD_LIBRARY_PATH",
            libpath_default: "",
            path_sep: ':',
        },
    }
}

/// Generates the wrapper source for one platform.
pub fn generate_wrapper(
    src_name: &str,
    platform: &Platform,
    binding: &ArtifactBinding,
    deps: &[RuntimeDependency],
    policy: &EnvPolicy,
) -> Result<String> {
    let env = os_env(platform);

    let mut globals = String::new();
    let mut init_body = String::new();
    // BTreeMap iteration gives variable-name order
    for located in binding.products.values() {
        globals.push_str(&product_globals(located, &env, policy));
        init_body.push_str(&product_init(located));
    }

    let exports: Vec<&str> = binding.products.keys().map(String::as_str).collect();

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let mut data: BTreeMap<&str, String> = BTreeMap::new();
    data.insert("package_name", wrapper_name(src_name));
    data.insert("artifact_name", src_name.to_string());
    data.insert("triplet", platform.triplet());
    data.insert("export_line", export_line(&exports));
    data.insert("libpath_env", env.libpath_env.to_string());
    data.insert("libpath_default", env.libpath_default.to_string());
    data.insert("path_sep", env.path_sep.to_string());
    data.insert("globals", globals);
    data.insert("init_body", init_body);
    data.insert("dep_merge", dependency_merge(deps));

    Ok(handlebars.render_template(template::WRAPPER_TEMPLATE, &data)?)
}

/// The `export` statement for a product set, or nothing when it is empty
/// (a bare `export` is not legal source).
pub fn export_line(names: &[&str]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!("export {}\n", names.join(", "))
    }
}

/// Renders the `[...]` literal for a product's compile-time split path.
fn splitpath_literal(located: &LocatedProduct) -> String {
    let segments: Vec<String> = located
        .split_path()
        .iter()
        .map(|s| format!("{s:?}"))
        .collect();
    format!("[{}]", segments.join(", "))
}

/// Global declarations for one product, per its variant.
fn product_globals(located: &LocatedProduct, env: &OsEnv, policy: &EnvPolicy) -> String {
    let var = located.product.var_name();
    let mut block = format!(
        "# Relative path to `{var}`\n\
         const {var}_splitpath = {literal}\n\n\
         # This will be filled out by __init__()\n\
         {var}_path = \"\"\n\n",
        literal = splitpath_literal(located),
    );
    match &located.product {
        Product::Library(_) | Product::Framework(_) => {
            let soname = located
                .soname
                .as_deref()
                .or_else(|| located.split_path().last().copied())
                .unwrap_or(var);
            block.push_str(&format!(
                "# {var}-specific global declaration\n\
                 {var}_handle = C_NULL\n\n\
                 # This must be `const` so that we can use it with `ccall()`\n\
                 const {var} = \"{soname}\"\n\n"
            ));
        }
        Product::Executable(_) => {
            block.push_str(&executable_accessor(var, env, policy));
        }
        Product::File(_) => {}
    }
    block
}

/// The callback-style accessor declared for an executable product.
///
/// The accessor temporarily augments PATH and the library search path for
/// the duration of the callback via `withenv`, then invokes the callback
/// with the resolved executable path.
fn executable_accessor(var: &str, env: &OsEnv, policy: &EnvPolicy) -> String {
    let sep = env.path_sep;
    let libpath_env = env.libpath_env;
    let adjust_path = policy.adjust_path;
    let adjust_libpath = policy.adjust_libpath;
    format!(
        "\"\"\"\n    \
             {var}(f::Function; adjust_PATH::Bool = {adjust_path}, adjust_LIBPATH::Bool = {adjust_libpath})\n\n\
         Run the `{var}` executable, with PATH and LIBPATH adjusted for the\n\
         duration of the call.\n\
         \"\"\"\n\
         function {var}(f::Function; adjust_PATH::Bool = {adjust_path}, adjust_LIBPATH::Bool = {adjust_libpath})\n    \
             global PATH, LIBPATH\n    \
             env_mapping = Dict{{String,String}}()\n    \
             if adjust_PATH\n        \
                 if !isempty(get(ENV, \"PATH\", \"\"))\n            \
                     env_mapping[\"PATH\"] = string(PATH, '{sep}', ENV[\"PATH\"])\n        \
                 else\n            \
                     env_mapping[\"PATH\"] = PATH\n        \
                 end\n    \
             end\n    \
             if adjust_LIBPATH\n        \
                 LIBPATH_base = get(ENV, \"{libpath_env}\", expanduser(LIBPATH_default))\n        \
                 if !isempty(LIBPATH_base)\n            \
                     env_mapping[\"{libpath_env}\"] = string(LIBPATH, '{sep}', LIBPATH_base)\n        \
                 else\n            \
                     env_mapping[\"{libpath_env}\"] = LIBPATH\n        \
                 end\n    \
             end\n    \
             withenv(env_mapping...) do\n        \
                 f({var}_path)\n    \
             end\n\
         end\n\n"
    )
}

/// `__init__` statements for one product, per its variant.
fn product_init(located: &LocatedProduct) -> String {
    let var = located.product.var_name();
    let mut block = format!(
        "    global {var}_path = normpath(joinpath(artifact_dir, {var}_splitpath...))\n"
    );
    match &located.product {
        Product::Library(_) | Product::Framework(_) => {
            block.push_str(&format!(
                "\n    # Manually `dlopen()` this right now so that future `ccall` invocations\n    \
                 # by its SONAME resolve this path without re-searching.\n    \
                 global {var}_handle = dlopen({var}_path)\n    \
                 push!(LIBPATH_list, dirname({var}_path))\n\n"
            ));
        }
        Product::Executable(_) => {
            block.push_str(&format!("    push!(PATH_list, dirname({var}_path))\n\n"));
        }
        Product::File(_) => {
            block.push('\n');
        }
    }
    block
}

/// The dependency PATH/LIBPATH merge block, empty when there are no
/// dependencies.
///
/// Dependency lists must already be populated when this runs; the host
/// loading mechanism initializes dependencies before dependents.
fn dependency_merge(deps: &[RuntimeDependency]) -> String {
    if deps.is_empty() {
        return String::new();
    }
    let mut names: Vec<&str> = deps.iter().map(RuntimeDependency::name).collect();
    names.sort_unstable();
    let path_lists: Vec<String> = names.iter().map(|n| format!("{n}.PATH_list")).collect();
    let libpath_lists: Vec<String> = names.iter().map(|n| format!("{n}.LIBPATH_list")).collect();
    format!(
        "\n    # Append each dependency's PATH and LIBPATH lists to our own.\n    \
         foreach(p -> append!(PATH_list, p), ({},))\n    \
         foreach(p -> append!(LIBPATH_list, p), ({},))\n\n",
        path_lists.join(", "),
        libpath_lists.join(", "),
    )
}
