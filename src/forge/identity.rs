//! Deterministic package identifier derivation.
//!
//! Wrapper packages are tagged with a 128-bit identifier derived from the
//! package name, so that rebuilding a package from scratch always lands on
//! the same identifier as every previously published revision. The scheme is
//! inherited from the legacy publishing tool and is preserved bit-for-bit:
//! identifiers already in the ecosystem's registries must keep resolving.

use sha1::{Digest, Sha1};
use uuid::{Uuid, uuid};

/// Namespace for all derived wrapper-package identifiers.
const FORGE_NAMESPACE: Uuid = uuid!("cfb74b52-ec16-5bb7-a574-95d9e393895e");

// Variant/version bit-forcing constants of the legacy name-based scheme.
// Treated as a black-box transform; do not re-derive.
const UUID_MASK: u128 = 0xffffffffffff0fff3fffffffffffffff;
const UUID_BITS: u128 = 0x00000000000050008000000000000000;

/// Derives the identifier for a fully qualified package name.
///
/// Hashes the namespace (as little-endian bytes) concatenated with
/// `name + "_jll"` -- the suffix is a historical artifact of the legacy
/// scheme and must be kept so previously published identifiers reproduce.
/// The low 128 bits of the SHA-1 digest are read little-endian and the
/// variant/version bits are forced so the result is a syntactically valid
/// version-5 identifier.
pub fn derive_identifier(name: &str) -> Uuid {
    let mut hasher = Sha1::new();
    hasher.update(FORGE_NAMESPACE.as_u128().to_le_bytes());
    hasher.update(name.as_bytes());
    hasher.update(b"_jll");
    let digest = hasher.finalize();

    let mut low = [0u8; 16];
    low.copy_from_slice(&digest[..16]);
    let mut value = u128::from_le_bytes(low);
    value &= UUID_MASK;
    value |= UUID_BITS;
    Uuid::from_u128(value)
}

/// Derives the identifier of the wrapper package for a source package.
///
/// The wrapper package is named `<src_name>_jll`, and its identifier is the
/// derived identifier of that full name.
pub fn wrapper_identifier(src_name: &str) -> Uuid {
    derive_identifier(&format!("{src_name}_jll"))
}

/// Returns the wrapper package name for a source package name.
pub fn wrapper_name(src_name: &str) -> String {
    format!("{src_name}_jll")
}

/// Validates that a package name is a legal identifier.
pub fn valid_package_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(derive_identifier("LibFoo"), derive_identifier("LibFoo"));
        assert_ne!(derive_identifier("LibFoo"), derive_identifier("LibBar"));
    }

    #[test]
    fn published_golden_vectors() {
        // Identifiers of wrapper packages already published in the ecosystem.
        assert_eq!(
            wrapper_identifier("Zlib").to_string(),
            "83775a58-1f1d-513f-b197-d71354ab007a"
        );
        assert_eq!(
            wrapper_identifier("FFMPEG").to_string(),
            "b22a6f82-2f65-5046-a5b2-351ab43fb4e5"
        );
    }

    #[test]
    fn version5_shape() {
        let id = derive_identifier("anything");
        let s = id.to_string();
        // Forced version nibble and variant bits
        assert_eq!(&s[14..15], "5");
        let variant = s.as_bytes()[19];
        assert!(matches!(variant, b'8' | b'9' | b'a' | b'b'));
    }

    #[test]
    fn name_validation() {
        assert!(valid_package_name("Zlib"));
        assert!(valid_package_name("_internal2"));
        assert!(!valid_package_name("2fast"));
        assert!(!valid_package_name("has-dash"));
        assert!(!valid_package_name(""));
    }
}
