//! Content-addressed tree hashing of extracted artifact trees.
//!
//! Computes the same SHA-1 tree hash git itself would assign to a directory:
//! blobs are hashed as `blob <len>\0<content>`, trees as `tree <len>\0`
//! followed by `<mode> <name>\0<sha>` entries in git's sort order (where a
//! directory sorts as its name plus a trailing `/`). Symlinks hash their
//! target text; the executable bit selects mode `100755`. Empty directories
//! are not representable in the git object model and are skipped.

use std::path::Path;

use sha1::{Digest, Sha1};

use crate::forge::error::{ErrorExt, Result};

/// Hex-encoded git tree hash of the directory at `root`.
///
/// Runs on the blocking pool; the tree walk is synchronous.
pub async fn git_tree_hash(root: &Path) -> Result<String> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || hash_tree(&root).map(|sha| hex::encode(sha)))
        .await?
}

const SHA_LEN: usize = 20;

struct TreeEntry {
    /// git sorts tree entries by name with directories keyed as `name/`
    sort_key: Vec<u8>,
    mode: &'static str,
    name: String,
    sha: [u8; SHA_LEN],
}

fn hash_object(kind: &str, content: &[u8]) -> [u8; SHA_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(kind.as_bytes());
    hasher.update(b" ");
    hasher.update(content.len().to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(content);
    hasher.finalize().into()
}

fn hash_tree(dir: &Path) -> Result<[u8; SHA_LEN]> {
    let mut entries: Vec<TreeEntry> = Vec::new();
    let dir_entries = std::fs::read_dir(dir).fs_context("reading directory", dir)?;
    for entry in dir_entries {
        let entry = entry.fs_context("reading directory entry", dir)?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let meta = std::fs::symlink_metadata(&path).fs_context("inspecting entry", &path)?;

        if meta.file_type().is_symlink() {
            let target = std::fs::read_link(&path).fs_context("reading symlink", &path)?;
            let sha = hash_object("blob", target.to_string_lossy().as_bytes());
            entries.push(TreeEntry {
                sort_key: name.as_bytes().to_vec(),
                mode: "120000",
                name,
                sha,
            });
        } else if meta.is_dir() {
            // git cannot represent empty directories
            if std::fs::read_dir(&path)
                .fs_context("reading directory", &path)?
                .next()
                .is_none()
            {
                continue;
            }
            let sha = hash_tree(&path)?;
            let mut sort_key = name.as_bytes().to_vec();
            sort_key.push(b'/');
            entries.push(TreeEntry {
                sort_key,
                mode: "40000",
                name,
                sha,
            });
        } else {
            let content = std::fs::read(&path).fs_context("reading file", &path)?;
            let sha = hash_object("blob", &content);
            entries.push(TreeEntry {
                sort_key: name.as_bytes().to_vec(),
                mode: if is_executable(&meta) { "100755" } else { "100644" },
                name,
                sha,
            });
        }
    }

    entries.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

    let mut payload = Vec::new();
    for entry in &entries {
        payload.extend_from_slice(entry.mode.as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(entry.name.as_bytes());
        payload.push(b'\0');
        payload.extend_from_slice(&entry.sha);
    }
    Ok(hash_object("tree", &payload))
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    false
}
