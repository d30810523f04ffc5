//! Build revision resolution.
//!
//! When the same semantic version of a package is rebuilt and republished,
//! the publishes are disambiguated by a monotonically increasing integer in
//! the version's build metadata. This module computes the next such revision
//! by consulting the registry for prior publishes of the same
//! major/minor/patch.

use log::{debug, info};
use semver::{BuildMetadata, Version};

use crate::forge::error::Result;
use crate::forge::identity::wrapper_identifier;
use crate::forge::registry::Registry;

/// Pins the build revision of a wrapper package version.
///
/// A version that already carries build metadata is treated as final and
/// returned unchanged. Otherwise the registry view is refreshed, prior
/// publishes with the same major/minor/patch are collected, and the result
/// carries build number `max + 1` (or `0` when nothing matched). Published
/// versions whose build metadata is not a single non-negative integer are
/// excluded from the candidate set.
pub async fn resolve_build_version<R: Registry>(
    registry: &mut R,
    src_name: &str,
    src_version: &Version,
) -> Result<Version> {
    if !src_version.build.is_empty() {
        return Ok(src_version.clone());
    }

    registry.refresh().await?;
    let uuid = wrapper_identifier(src_name);
    let published = registry.published_versions(&uuid).await?;
    debug!("{src_name}: {} published versions for {uuid}", published.len());

    let max_build = published
        .iter()
        .filter(|v| {
            v.major == src_version.major
                && v.minor == src_version.minor
                && v.patch == src_version.patch
        })
        .filter_map(|v| v.build.parse::<u64>().ok())
        .max();
    let next_build = max_build.map_or(0, |b| b + 1);

    let resolved = Version {
        major: src_version.major,
        minor: src_version.minor,
        patch: src_version.patch,
        pre: src_version.pre.clone(),
        build: BuildMetadata::new(&next_build.to_string())?,
    };
    info!("{src_name}: pinned version {resolved}");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::registry::StaticRegistry;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[tokio::test]
    async fn idempotent_on_final_versions() {
        let mut registry = StaticRegistry::new();
        let version = v("1.2.11+7");
        let resolved = resolve_build_version(&mut registry, "Zlib", &version)
            .await
            .unwrap();
        assert_eq!(resolved, version);
    }

    #[tokio::test]
    async fn first_publish_gets_build_zero() {
        let mut registry = StaticRegistry::new();
        let resolved = resolve_build_version(&mut registry, "Zlib", &v("1.2.11"))
            .await
            .unwrap();
        assert_eq!(resolved.to_string(), "1.2.11+0");
    }

    #[tokio::test]
    async fn increments_past_max_matching_build() {
        let mut registry = StaticRegistry::new();
        let uuid = wrapper_identifier("Zlib");
        registry.publish(uuid, v("1.2.11+0"));
        registry.publish(uuid, v("1.2.11+3"));
        registry.publish(uuid, v("1.2.10+9"));
        let resolved = resolve_build_version(&mut registry, "Zlib", &v("1.2.11"))
            .await
            .unwrap();
        assert_eq!(resolved.to_string(), "1.2.11+4");
    }

    #[tokio::test]
    async fn malformed_build_metadata_excluded() {
        let mut registry = StaticRegistry::new();
        let uuid = wrapper_identifier("Zlib");
        registry.publish(uuid, v("1.2.11+abc"));
        registry.publish(uuid, v("1.2.11+1.2"));
        let resolved = resolve_build_version(&mut registry, "Zlib", &v("1.2.11"))
            .await
            .unwrap();
        assert_eq!(resolved.to_string(), "1.2.11+0");
    }

    #[tokio::test]
    async fn prerelease_carried_through() {
        let mut registry = StaticRegistry::new();
        let resolved = resolve_build_version(&mut registry, "Zlib", &v("2.0.0-rc.1"))
            .await
            .unwrap();
        assert_eq!(resolved.to_string(), "2.0.0-rc.1+0");
    }
}
