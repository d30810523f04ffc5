//! Artifact metadata reconstruction from released tarballs.
//!
//! Rebuilds the full per-platform input to code generation from a directory
//! of already-built release tarballs, one per platform with the triplet
//! embedded in the filename. Each tarball is hashed, extracted into a
//! scope-bound scratch directory, tree-hashed, and searched for every
//! declared product. A missing tarball or product is fatal: the release is
//! incomplete and must not be published.

use std::path::{Path, PathBuf};

use log::info;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::bail;
use crate::forge::assemble::locate::locate_products;
use crate::forge::assemble::treehash::git_tree_hash;
use crate::forge::error::{Error, ErrorExt, Result};
use crate::forge::platform::Platform;
use crate::forge::products::{ArtifactBinding, BuildOutputMeta, Product};

/// Reconstructs [`BuildOutputMeta`] from a directory of release tarballs.
pub async fn rebuild_meta(
    tarball_dir: &Path,
    platforms: &[Platform],
    products: &[Product],
) -> Result<BuildOutputMeta> {
    let mut meta = BuildOutputMeta::default();
    for platform in platforms {
        let tarball = find_tarball(tarball_dir, platform).await?;
        let binding = bind_tarball(&tarball, platform, products).await?;
        info!(
            "rebuilt {} binding from {}",
            platform,
            tarball.display()
        );
        meta.platforms.insert(*platform, binding);
    }
    Ok(meta)
}

/// Locates the release tarball for one platform by triplet substring,
/// accepting the legacy `arm-` spelling.
async fn find_tarball(dir: &Path, platform: &Platform) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .fs_context("reading tarball directory", dir)?;
    let mut candidates = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading tarball directory", dir)?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".tar.gz") && platform.matches_filename(&name) {
            candidates.push(entry.path());
        }
    }
    // Deterministic pick when several tarballs embed the same triplet
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::TarballNotFound {
            platform: platform.triplet(),
            dir: dir.to_path_buf(),
        })
}

/// Hashes, extracts, tree-hashes, and product-locates one tarball.
///
/// The scratch extraction directory is removed when this returns, on both
/// the success and error paths.
async fn bind_tarball(
    tarball: &Path,
    platform: &Platform,
    products: &[Product],
) -> Result<ArtifactBinding> {
    let tarball_sha256 = sha256_file(tarball).await?;

    let scratch = tempfile::tempdir().fs_context("creating scratch directory", tarball)?;
    extract_tarball(tarball, scratch.path()).await?;
    let tree_hash = git_tree_hash(scratch.path()).await?;

    let root = scratch.path().to_path_buf();
    let platform = *platform;
    let products = products.to_vec();
    let located =
        tokio::task::spawn_blocking(move || locate_products(&root, &platform, &products)).await??;

    let Some(tarball_name) = tarball.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        bail!("tarball path has no filename: {}", tarball.display());
    };
    Ok(ArtifactBinding {
        tarball_name,
        tarball_sha256,
        tree_hash,
        products: located,
    })
}

/// SHA-256 of a file, read in 8KB chunks, hex encoded.
pub async fn sha256_file(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];
    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hashing", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Unpacks a gzipped tarball into `dest` on the blocking pool.
async fn extract_tarball(tarball: &Path, dest: &Path) -> Result<()> {
    let tarball = tarball.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::open(&tarball).fs_context("opening tarball", &tarball)?;
        let decoder = flate2::read::GzDecoder::new(file);
        let mut archive = tar::Archive::new(decoder);
        archive.set_preserve_permissions(true);
        archive
            .unpack(&dest)
            .fs_context("unpacking tarball", &dest)?;
        Ok(())
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::products::{ExecutableProduct, FileProduct};

    /// Builds a small gzipped tarball containing `bin/tool` and `share/doc.txt`.
    fn write_test_tarball(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let mut header = tar::Header::new_gnu();
        header.set_size(5);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "bin/tool", &b"tool\n"[..])
            .unwrap();

        let mut header = tar::Header::new_gnu();
        header.set_size(4);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "share/doc.txt", &b"doc\n"[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[tokio::test]
    async fn rebuilds_binding_from_tarball() {
        let dir = tempfile::tempdir().unwrap();
        let platform: Platform = "x86_64-linux-gnu".parse().unwrap();
        let tarball = dir.path().join("Tool.v1.0.0.x86_64-linux-gnu.tar.gz");
        write_test_tarball(&tarball);

        let products = [
            Product::Executable(ExecutableProduct {
                var_name: "tool".into(),
                name: "tool".into(),
            }),
            Product::File(FileProduct {
                var_name: "doc".into(),
                path: "share/doc.txt".into(),
            }),
        ];
        let meta = rebuild_meta(dir.path(), &[platform], &products)
            .await
            .unwrap();
        let binding = &meta.platforms[&platform];
        assert_eq!(binding.tarball_name, "Tool.v1.0.0.x86_64-linux-gnu.tar.gz");
        assert_eq!(binding.tarball_sha256.len(), 64);
        assert_eq!(binding.tree_hash.len(), 40);
        assert_eq!(binding.products["tool"].path, "bin/tool");
        assert_eq!(binding.products["doc"].path, "share/doc.txt");
    }

    #[tokio::test]
    async fn missing_tarball_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let platform: Platform = "x86_64-apple-darwin14".parse().unwrap();
        let err = rebuild_meta(dir.path(), &[platform], &[]).await.unwrap_err();
        assert!(matches!(err, Error::TarballNotFound { .. }));
    }

    #[tokio::test]
    async fn missing_product_in_tarball_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let platform: Platform = "x86_64-linux-gnu".parse().unwrap();
        write_test_tarball(&dir.path().join("Tool.v1.0.0.x86_64-linux-gnu.tar.gz"));
        let products = [Product::Executable(ExecutableProduct {
            var_name: "absent".into(),
            name: "absent".into(),
        })];
        let err = rebuild_meta(dir.path(), &[platform], &products)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProductNotFound { .. }));
    }

    #[tokio::test]
    async fn sha256_matches_known_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        tokio::fs::write(&path, b"").await.unwrap();
        assert_eq!(
            sha256_file(&path).await.unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
