//! Hosting-service repository provisioning.
//!
//! Thin plumbing around the core: make sure the target repository exists on
//! the hosting service (creating it if absent, tolerating the benign race
//! where another publisher created it first) and that a local working copy
//! exists and is hard-reset to the upstream default branch.

use std::path::Path;

use log::{debug, info};
use reqwest::StatusCode;
use url::Url;

use crate::forge::error::{Error, ErrorExt, Result};

/// Coordinates of a hosting-service repository.
#[derive(Debug, Clone)]
pub struct RepoSpec {
    /// Base URL of the hosting service API, e.g. `https://api.github.com`
    pub api_base: Url,
    /// Owning organization or user
    pub owner: String,
    /// Repository name
    pub name: String,
    /// URL used for clone/fetch
    pub clone_url: Url,
    /// API token; anonymous when absent
    pub token: Option<String>,
}

impl RepoSpec {
    fn repo_url(&self) -> Result<Url> {
        Ok(self
            .api_base
            .join(&format!("repos/{}/{}", self.owner, self.name))?)
    }

    fn create_url(&self) -> Result<Url> {
        Ok(self.api_base.join(&format!("orgs/{}/repos", self.owner))?)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("User-Agent", "jll-forge");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Ensures the repository exists remotely and as a clean local working copy.
///
/// The local copy at `local_dir` is cloned when absent, then fetched and
/// hard-reset to the upstream default branch, discarding local edits.
pub async fn provision(spec: &RepoSpec, local_dir: &Path) -> Result<()> {
    let default_branch = ensure_remote(spec).await?;
    ensure_local(spec, local_dir, &default_branch).await
}

/// Ensures the remote repository exists, returning its default branch.
async fn ensure_remote(spec: &RepoSpec) -> Result<String> {
    let client = reqwest::Client::new();
    if let Some(branch) = remote_default_branch(spec, &client).await? {
        debug!("repository {}/{} already exists", spec.owner, spec.name);
        return Ok(branch);
    }

    info!("creating repository {}/{}", spec.owner, spec.name);
    let body = serde_json::json!({ "name": spec.name });
    let response = spec
        .request(client.post(spec.create_url()?))
        .json(&body)
        .send()
        .await?;
    if !response.status().is_success() {
        // Another publisher may have created it between our check and the
        // create call; re-check before giving up.
        if let Some(branch) = remote_default_branch(spec, &client).await? {
            return Ok(branch);
        }
        return Err(Error::RepoError(format!(
            "creating {}/{} failed with status {}",
            spec.owner,
            spec.name,
            response.status()
        )));
    }
    remote_default_branch(spec, &client)
        .await?
        .ok_or_else(|| Error::RepoError(format!("{}/{} missing after creation", spec.owner, spec.name)))
}

/// Default branch of the remote repository, or `None` when it does not exist.
async fn remote_default_branch(
    spec: &RepoSpec,
    client: &reqwest::Client,
) -> Result<Option<String>> {
    let response = spec.request(client.get(spec.repo_url()?)).send().await?;
    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => {
            let body: serde_json::Value = response.json().await?;
            Ok(Some(
                body.get("default_branch")
                    .and_then(|b| b.as_str())
                    .unwrap_or("main")
                    .to_string(),
            ))
        }
        status => Err(Error::RepoError(format!(
            "querying {}/{} failed with status {status}",
            spec.owner, spec.name
        ))),
    }
}

/// Clones the repository when absent, then hard-resets to the upstream
/// default branch.
async fn ensure_local(spec: &RepoSpec, local_dir: &Path, default_branch: &str) -> Result<()> {
    let git = which::which("git")
        .map_err(|e| Error::RepoError(format!("git executable not found: {e}")))?;

    if !local_dir.join(".git").is_dir() {
        if let Some(parent) = local_dir.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating clone parent directory", parent)?;
        }
        let target = local_dir.to_string_lossy();
        run_git(
            &git,
            None,
            &["clone", spec.clone_url.as_str(), target.as_ref()],
        )
        .await?;
    } else {
        run_git(&git, Some(local_dir), &["fetch", "origin"]).await?;
    }
    run_git(
        &git,
        Some(local_dir),
        &["reset", "--hard", &format!("origin/{default_branch}")],
    )
    .await?;
    Ok(())
}

async fn run_git(git: &Path, cwd: Option<&Path>, args: &[&str]) -> Result<()> {
    let mut command = tokio::process::Command::new(git);
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    let output = command
        .output()
        .await
        .fs_context("running git", git)?;
    if !output.status.success() {
        return Err(Error::RepoError(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_urls_from_spec() {
        let spec = RepoSpec {
            api_base: Url::parse("https://api.github.com/").unwrap(),
            owner: "JuliaBinaryWrappers".into(),
            name: "Zlib_jll.jl".into(),
            clone_url: Url::parse("https://github.com/JuliaBinaryWrappers/Zlib_jll.jl.git")
                .unwrap(),
            token: None,
        };
        assert_eq!(
            spec.repo_url().unwrap().as_str(),
            "https://api.github.com/repos/JuliaBinaryWrappers/Zlib_jll.jl"
        );
        assert_eq!(
            spec.create_url().unwrap().as_str(),
            "https://api.github.com/orgs/JuliaBinaryWrappers/repos"
        );
    }
}
