//! The `provision` command: ensure a hosting-service repository exists and
//! is checked out locally.

use path_absolutize::Absolutize;
use url::Url;

use crate::cli::args::ProvisionArgs;
use crate::error::Result;
use crate::forge::repo::{RepoSpec, provision};

pub async fn run(args: &ProvisionArgs) -> Result<i32> {
    let clone_url = match &args.clone_url {
        Some(url) => url.clone(),
        None => Url::parse(&format!(
            "https://github.com/{}/{}.git",
            args.owner, args.name
        ))
        .map_err(crate::forge::Error::from)?,
    };
    let spec = RepoSpec {
        api_base: args.api_base.clone(),
        owner: args.owner.clone(),
        name: args.name.clone(),
        clone_url,
        token: args.token.clone(),
    };
    let dir = args.dir.absolutize()?.to_path_buf();
    provision(&spec, &dir).await?;
    Ok(0)
}
