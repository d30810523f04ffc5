//! HTTP-backed registry client.
//!
//! Fetches a JSON index mapping package identifiers to published version
//! strings. The index is cached in memory; `refresh()` refetches it so that
//! publishes by other agents since the last fetch become visible. Transport
//! failures propagate: the caller must not publish without a correct view.

use std::collections::HashMap;

use log::{debug, warn};
use semver::Version;
use url::Url;
use uuid::Uuid;

use crate::forge::error::{Context, Error, Result};
use crate::forge::registry::Registry;

/// Registry client backed by an HTTP JSON index.
#[derive(Debug)]
pub struct HttpRegistry {
    index_url: Url,
    client: reqwest::Client,
    index: Option<HashMap<Uuid, Vec<Version>>>,
}

impl HttpRegistry {
    /// Client for the index document at `index_url`. No fetch happens until
    /// the first `refresh()`.
    pub fn new(index_url: Url) -> Self {
        HttpRegistry {
            index_url,
            client: reqwest::Client::new(),
            index: None,
        }
    }
}

impl Registry for HttpRegistry {
    async fn refresh(&mut self) -> Result<()> {
        debug!("refreshing registry index from {}", self.index_url);
        let response = self
            .client
            .get(self.index_url.clone())
            .send()
            .await?
            .error_for_status()?;
        let raw: HashMap<String, Vec<String>> =
            response.json().await.context("parsing registry index")?;

        let mut index = HashMap::with_capacity(raw.len());
        for (uuid, versions) in raw {
            let uuid: Uuid = uuid
                .parse()
                .map_err(|_| Error::RegistryError(format!("malformed identifier {uuid:?}")))?;
            let mut parsed = Vec::with_capacity(versions.len());
            for v in versions {
                match Version::parse(&v) {
                    Ok(version) => parsed.push(version),
                    Err(e) => warn!("skipping malformed registry version {v:?} for {uuid}: {e}"),
                }
            }
            index.insert(uuid, parsed);
        }
        self.index = Some(index);
        Ok(())
    }

    async fn published_versions(&self, uuid: &Uuid) -> Result<Vec<Version>> {
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| Error::RegistryError("registry index not yet refreshed".to_string()))?;
        Ok(index.get(uuid).cloned().unwrap_or_default())
    }
}
