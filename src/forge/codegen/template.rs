//! Handlebars templates for generated package sources.
//!
//! Templates carry the fixed skeletons; per-product blocks are composed in
//! Rust and substituted as prerendered strings, since the per-variant rules
//! would be unreadable as template loops.

/// Skeleton of one per-platform wrapper source.
pub const WRAPPER_TEMPLATE: &str = r#"# Autogenerated wrapper script for {{package_name}} for {{triplet}}
{{export_line}}
## Global variables
PATH = ""
LIBPATH = ""
LIBPATH_env = "{{libpath_env}}"
LIBPATH_default = "{{libpath_default}}"

{{globals}}"""
Open all libraries
"""
function __init__()
    global artifact_dir = abspath(artifact"{{artifact_name}}")

    # Initialize PATH and LIBPATH environment variable listings
    global PATH_list, LIBPATH_list
{{dep_merge}}{{init_body}}    # Filter out duplicate and empty entries in our PATH and LIBPATH entries
    filter!(!isempty, unique!(PATH_list))
    filter!(!isempty, unique!(LIBPATH_list))
    global PATH = join(PATH_list, '{{path_sep}}')
    global LIBPATH = join(vcat(LIBPATH_list, [joinpath(Sys.BINDIR, Base.LIBDIR, "julia"), joinpath(Sys.BINDIR, Base.LIBDIR)]), '{{path_sep}}')
end  # __init__()
"#;

/// Skeleton of the top-level dispatch module.
pub const DISPATCH_TEMPLATE: &str = r#"module {{package_name}}

using Pkg, Pkg.BinaryPlatforms, Pkg.Artifacts, Libdl
import Base: UUID

# Inter-package API values; always defined, even when there are no binary
# products for the host platform.
const PATH_list = String[]
const LIBPATH_list = String[]
{{export_line}}
{{selection}}
end  # module {{package_name}}
"#;

/// Load-time platform selection block for multi-platform packages.
pub const DISPATCH_SELECT_TEMPLATE: &str = r#"# Load Artifacts.toml and enumerate the platforms recorded there.
artifacts_toml = joinpath(@__DIR__, "..", "Artifacts.toml")
artifacts = Pkg.Artifacts.load_artifacts_toml(artifacts_toml; pkg_uuid=UUID("{{uuid}}"))
platforms = [Pkg.Artifacts.unpack_platform(e, "{{artifact_name}}", artifacts_toml) for e in artifacts["{{artifact_name}}"]]

# Keep only platforms whose wrapper exists on disk. Older host runtimes
# spell the hard-float ARM triplet "arm-linux-gnueabihf" while generated
# filenames always use the newer "armv7l-" spelling, so substitute before
# looking on disk.
filter!(p -> isfile(joinpath(@__DIR__, "wrappers", replace(triplet(p), "arm-" => "armv7l-") * ".jl")), platforms)

# From the available options, choose the best match for the host.
best_platform = select_platform(Dict(p => triplet(p) for p in platforms))

# Silently fail if there are no binaries for this platform
if best_platform === nothing
    @debug("Unable to load {{artifact_name}}; unsupported platform $(Sys.MACHINE)")
else
    best_wrapper = joinpath(@__DIR__, "wrappers", replace(best_platform, "arm-" => "armv7l-") * ".jl")
    include(best_wrapper)
end
"#;

/// Direct-include selection block for platform-independent packages.
pub const DISPATCH_ANY_TEMPLATE: &str = r#"# Platform-independent artifact; load its wrapper directly.
include(joinpath(@__DIR__, "wrappers", "any.jl"))
"#;

/// Skeleton of the generated readme.
pub const README_TEMPLATE: &str = r#"# {{package_name}}

This is an autogenerated package constructed using `jll-forge`.{{provenance}}

## Sources

The tarballs for the binaries in this package were built from these sources:

{{sources}}
## Platforms

`{{package_name}}` is available for the following platforms:

{{platforms}}
## Dependencies

{{dependencies}}
## Products

The code bindings within this package are autogenerated from the following products:

{{products}}"#;
