//! The `rebuild` command: recipe + release tarballs -> full package tree.

use log::info;
use path_absolutize::Absolutize;

use crate::cli::args::RebuildArgs;
use crate::error::Result;
use crate::forge::assemble::{Options, RebuildRequest, rebuild};
use crate::forge::codegen::EnvPolicy;
use crate::forge::registry::{HttpRegistry, StaticRegistry};
use crate::recipe::Recipe;

pub async fn run(args: &RebuildArgs) -> Result<i32> {
    let recipe = Recipe::load(&args.recipe).await?;
    let package_dir = args.output.absolutize()?.to_path_buf();
    let tarball_dir = args.tarballs.absolutize()?.to_path_buf();

    let request = RebuildRequest {
        src_name: recipe.name.clone(),
        version: recipe.version.clone(),
        sources: recipe.source_urls(),
        platforms: recipe.platforms()?,
        products: recipe.products(),
        dependencies: recipe.dependencies()?,
        bin_prefix: args.bin_prefix.clone(),
        tarball_dir,
        package_dir: package_dir.clone(),
        options: Options {
            from_scratch: !args.incremental,
            lazy: args.lazy,
            julia_compat: args.julia_compat.clone(),
            env_policy: EnvPolicy::default(),
        },
    };

    match &args.registry_url {
        Some(url) => {
            let mut registry = HttpRegistry::new(url.clone());
            rebuild(&request, &mut registry).await?;
        }
        None => {
            let mut registry = StaticRegistry::new();
            rebuild(&request, &mut registry).await?;
        }
    }

    info!("package tree written to {}", package_dir.display());
    Ok(0)
}
