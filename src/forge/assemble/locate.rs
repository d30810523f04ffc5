//! Product location within an unpacked artifact tree.
//!
//! Walks an extracted release tree and resolves every declared product to a
//! relative path, capturing library sonames from the binaries themselves
//! (ELF `DT_SONAME`, Mach-O install names) with a filename fallback. Failure
//! to locate any declared product is fatal: a partially wrapped release must
//! not be published.

use std::collections::BTreeMap;
use std::path::Path;

use goblin::Object;
use log::debug;
use walkdir::WalkDir;

use crate::forge::error::{Error, ErrorExt, Result};
use crate::forge::platform::{Os, Platform};
use crate::forge::products::{LocatedProduct, Product};

/// Resolves each declared product to its location under `root`.
///
/// Synchronous; callers run this on the blocking pool alongside extraction.
pub fn locate_products(
    root: &Path,
    platform: &Platform,
    products: &[Product],
) -> Result<BTreeMap<String, LocatedProduct>> {
    let mut located = BTreeMap::new();
    for product in products {
        let found = locate_product(root, platform, product)?.ok_or_else(|| {
            Error::ProductNotFound {
                product: product.var_name().to_string(),
                platform: platform.triplet(),
            }
        })?;
        debug!(
            "located {} at {} for {platform}",
            product.var_name(),
            found.path
        );
        located.insert(product.var_name().to_string(), found);
    }
    Ok(located)
}

fn locate_product(
    root: &Path,
    platform: &Platform,
    product: &Product,
) -> Result<Option<LocatedProduct>> {
    match product {
        Product::File(file) => {
            if root.join(&file.path).is_file() {
                Ok(Some(LocatedProduct {
                    product: product.clone(),
                    path: file.path.clone(),
                    soname: None,
                }))
            } else {
                Ok(None)
            }
        }
        Product::Executable(exe) => {
            let filename = match platform.os() {
                Some(Os::Windows) => format!("{}.exe", exe.name),
                _ => exe.name.clone(),
            };
            Ok(find_file(root, |name| name == filename)?.map(|path| LocatedProduct {
                product: product.clone(),
                path,
                soname: None,
            }))
        }
        Product::Library(lib) => {
            let dlext = platform.os().unwrap_or(Os::Linux).dlext();
            let suffix = format!(".{dlext}");
            // Anchored at the extension boundary so a candidate `libz` never
            // matches a prefix-sharing library like `libzstd.so.1`
            let found = find_file(root, |name| {
                lib.names.iter().any(|candidate| {
                    name.strip_prefix(candidate.as_str())
                        .is_some_and(|rest| rest.starts_with('.') && rest.contains(&suffix))
                })
            })?;
            match found {
                Some(path) => {
                    let soname = capture_soname(&root.join(&path))
                        .or_else(|| path.rsplit('/').next().map(str::to_string));
                    Ok(Some(LocatedProduct {
                        product: product.clone(),
                        path,
                        soname,
                    }))
                }
                None => Ok(None),
            }
        }
        Product::Framework(fw) => {
            let framework_dir = format!("{}.framework", fw.name);
            let found = find_entry(root, |name, is_dir| is_dir && name == framework_dir)?;
            Ok(found.map(|path| {
                let binary = format!("{path}/{}", fw.name);
                let soname = capture_soname(&root.join(&binary));
                LocatedProduct {
                    product: product.clone(),
                    path,
                    soname: soname.or(Some(binary)),
                }
            }))
        }
    }
}

/// First file (in sorted walk order) whose name satisfies the predicate,
/// returned as a `/`-separated path relative to `root`.
fn find_file(root: &Path, predicate: impl Fn(&str) -> bool) -> Result<Option<String>> {
    find_entry(root, |name, is_dir| !is_dir && predicate(name))
}

fn find_entry(
    root: &Path,
    predicate: impl Fn(&str, bool) -> bool,
) -> Result<Option<String>> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Error::GenericError(format!("walking {}: {e}", root.display()))
        })?;
        let name = entry.file_name().to_string_lossy();
        if predicate(&name, entry.file_type().is_dir()) {
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| Error::GenericError(format!("stripping prefix: {e}")))?;
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            return Ok(Some(joined));
        }
    }
    Ok(None)
}

/// Reads the soname (ELF) or install name (Mach-O) from a shared library.
fn capture_soname(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path)
        .fs_context("reading library for soname capture", path)
        .ok()?;
    match Object::parse(&bytes).ok()? {
        Object::Elf(elf) => elf.soname.map(str::to_string),
        Object::Mach(goblin::mach::Mach::Binary(macho)) => macho.name.map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::products::{ExecutableProduct, FileProduct, LibraryProduct};

    fn linux() -> Platform {
        "x86_64-linux-gnu".parse().unwrap()
    }

    #[test]
    fn locates_file_executable_and_library() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::create_dir_all(dir.path().join("share")).unwrap();
        std::fs::write(dir.path().join("bin/zpipe"), b"").unwrap();
        std::fs::write(dir.path().join("lib/libz.so.1.2.11"), b"not a real elf").unwrap();
        std::fs::write(dir.path().join("share/zlib.pc"), b"").unwrap();

        let products = [
            Product::Executable(ExecutableProduct {
                var_name: "zpipe".into(),
                name: "zpipe".into(),
            }),
            Product::Library(LibraryProduct {
                var_name: "libz".into(),
                names: vec!["libz".into()],
            }),
            Product::File(FileProduct {
                var_name: "pc_file".into(),
                path: "share/zlib.pc".into(),
            }),
        ];
        let located = locate_products(dir.path(), &linux(), &products).unwrap();
        assert_eq!(located["zpipe"].path, "bin/zpipe");
        assert_eq!(located["libz"].path, "lib/libz.so.1.2.11");
        // Unparseable binary falls back to the filename
        assert_eq!(located["libz"].soname.as_deref(), Some("libz.so.1.2.11"));
        assert_eq!(located["pc_file"].path, "share/zlib.pc");
    }

    #[test]
    fn prefix_sharing_library_is_not_a_match() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib/libzstd.so.1"), b"").unwrap();

        let products = [Product::Library(LibraryProduct {
            var_name: "libz".into(),
            names: vec!["libz".into()],
        })];
        let err = locate_products(dir.path(), &linux(), &products).unwrap_err();
        assert!(matches!(err, Error::ProductNotFound { product, .. } if product == "libz"));

        // With the declared library actually present, it is found alongside
        // the prefix-sharing one
        std::fs::write(dir.path().join("lib/libz.so.1.2.11"), b"").unwrap();
        let located = locate_products(dir.path(), &linux(), &products).unwrap();
        assert_eq!(located["libz"].path, "lib/libz.so.1.2.11");
    }

    #[test]
    fn missing_product_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let products = [Product::Executable(ExecutableProduct {
            var_name: "missing".into(),
            name: "missing".into(),
        })];
        let err = locate_products(dir.path(), &linux(), &products).unwrap_err();
        assert!(matches!(err, Error::ProductNotFound { product, .. } if product == "missing"));
    }

    #[test]
    fn windows_executables_carry_exe_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::write(dir.path().join("bin/x264.exe"), b"").unwrap();
        let products = [Product::Executable(ExecutableProduct {
            var_name: "x264".into(),
            name: "x264".into(),
        })];
        let platform: Platform = "x86_64-w64-mingw32".parse().unwrap();
        let located = locate_products(dir.path(), &platform, &products).unwrap();
        assert_eq!(located["x264"].path, "bin/x264.exe");
    }
}
