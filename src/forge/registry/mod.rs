//! Registry collaborators used to discover previously published versions.
//!
//! The revision resolver only needs two operations: refresh the local view
//! of the registry (so concurrent publishes by other agents become visible)
//! and list the published versions of a package by identifier. Both the
//! HTTP-backed client and an in-memory implementation live here; the
//! in-memory one doubles as the offline mode and the test seam.

mod http;

pub use http::HttpRegistry;

use std::collections::HashMap;

use semver::Version;
use uuid::Uuid;

use crate::forge::error::Result;

/// View of the package registry, refreshable before each resolution.
pub trait Registry {
    /// Refreshes the local registry view so recent publishes are visible.
    async fn refresh(&mut self) -> Result<()>;

    /// All previously published versions of the package with the given
    /// identifier. Unknown identifiers yield an empty list.
    async fn published_versions(&self, uuid: &Uuid) -> Result<Vec<Version>>;
}

/// In-memory registry with a fixed version table.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    versions: HashMap<Uuid, Vec<Version>>,
}

impl StaticRegistry {
    /// Empty registry (no package has any published version).
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a published version for a package.
    pub fn publish(&mut self, uuid: Uuid, version: Version) {
        self.versions.entry(uuid).or_default().push(version);
    }
}

impl Registry for StaticRegistry {
    async fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    async fn published_versions(&self, uuid: &Uuid) -> Result<Vec<Version>> {
        Ok(self.versions.get(uuid).cloned().unwrap_or_default())
    }
}
