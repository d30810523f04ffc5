//! Artifact registry file maintenance.
//!
//! The registry (`Artifacts.toml`) maps the artifact name to per-platform
//! bindings: content hash, download descriptor, and laziness flag. The file
//! is edited format-preservingly so entries unrelated to the current run
//! survive a non-scratch regeneration. Platform-independent artifacts get a
//! single unconditional table; others get one platform-tagged entry per
//! platform in an array of tables.

use std::path::Path;

use toml_edit::{ArrayOfTables, DocumentMut, Item, Table, value};

use crate::forge::error::{ErrorExt, Result};
use crate::forge::platform::Platform;
use crate::forge::products::ArtifactBinding;

/// Loads the registry document, or an empty one when the file is absent.
pub async fn load_registry(path: &Path) -> Result<DocumentMut> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text.parse()?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DocumentMut::new()),
        Err(e) => Err(e).fs_context("reading artifact registry", path),
    }
}

/// Writes the registry document back to disk.
pub async fn save_registry(path: &Path, doc: &DocumentMut) -> Result<()> {
    tokio::fs::write(path, doc.to_string())
        .await
        .fs_context("writing artifact registry", path)
}

/// Registers one platform's artifact binding under `artifact_name`.
///
/// An existing entry for the same platform is replaced; entries for other
/// platforms and other artifact names are preserved untouched.
pub fn register_binding(
    doc: &mut DocumentMut,
    artifact_name: &str,
    platform: &Platform,
    binding: &ArtifactBinding,
    download_url: &str,
    lazy: bool,
) {
    let table = binding_table(platform, binding, download_url, lazy);
    match platform {
        Platform::Any => {
            doc[artifact_name] = Item::Table(table);
        }
        Platform::Target(triplet) => {
            if !matches!(doc.get(artifact_name), Some(Item::ArrayOfTables(_))) {
                doc[artifact_name] = Item::ArrayOfTables(ArrayOfTables::new());
            }
            // Item was just ensured to be an array of tables
            if let Some(Item::ArrayOfTables(entries)) = doc.get_mut(artifact_name) {
                entries.retain(|t| !platform_matches(t, triplet));
                entries.push(table);
            }
        }
    }
}

fn platform_matches(table: &Table, triplet: &crate::forge::platform::Triplet) -> bool {
    let key = |name: &str| table.get(name).and_then(Item::as_str);
    key("os") == Some(triplet.os.registry_key())
        && key("arch") == Some(triplet.arch.registry_key())
        && key("libc") == triplet.libc.map(|l| l.registry_key())
}

fn binding_table(
    platform: &Platform,
    binding: &ArtifactBinding,
    download_url: &str,
    lazy: bool,
) -> Table {
    let mut table = Table::new();
    if let Platform::Target(triplet) = platform {
        table["arch"] = value(triplet.arch.registry_key());
    }
    table["git-tree-sha1"] = value(binding.tree_hash.as_str());
    if lazy {
        table["lazy"] = value(true);
    }
    if let Platform::Target(triplet) = platform {
        if let Some(libc) = triplet.libc {
            table["libc"] = value(libc.registry_key());
        }
        table["os"] = value(triplet.os.registry_key());
    }

    let mut downloads = ArrayOfTables::new();
    let mut download = Table::new();
    download["sha256"] = value(binding.tarball_sha256.as_str());
    download["url"] = value(download_url);
    downloads.push(download);
    table["download"] = Item::ArrayOfTables(downloads);
    table
}
