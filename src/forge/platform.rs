//! Platform keys and canonical triplet serialization.
//!
//! A [`Platform`] identifies an OS/architecture/variant combination and
//! serializes to the ecosystem's canonical triplet string. All generated
//! output iterates platforms sorted by triplet, so [`Ord`] is defined by the
//! triplet text. The [`Platform::Any`] sentinel stands for
//! platform-independent artifacts.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::forge::error::Error;

/// Operating system family of a target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Macos,
    Windows,
    Freebsd,
}

impl Os {
    /// Key used in artifact registry entries.
    pub fn registry_key(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Macos => "macos",
            Os::Windows => "windows",
            Os::Freebsd => "freebsd",
        }
    }

    /// Dynamic library filename extension on this OS.
    pub fn dlext(self) -> &'static str {
        match self {
            Os::Windows => "dll",
            Os::Macos => "dylib",
            Os::Linux | Os::Freebsd => "so",
        }
    }
}

/// CPU architecture of a target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    I686,
    Aarch64,
    Armv7l,
    Powerpc64le,
}

impl Arch {
    /// Key used in artifact registry entries.
    pub fn registry_key(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::I686 => "i686",
            Arch::Aarch64 => "aarch64",
            Arch::Armv7l => "armv7l",
            Arch::Powerpc64le => "powerpc64le",
        }
    }
}

/// C library flavor, meaningful on Linux only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Libc {
    Glibc,
    Musl,
}

impl Libc {
    /// Key used in artifact registry entries.
    pub fn registry_key(self) -> &'static str {
        match self {
            Libc::Glibc => "glibc",
            Libc::Musl => "musl",
        }
    }
}

/// A concrete target platform with canonical triplet serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triplet {
    pub arch: Arch,
    pub os: Os,
    pub libc: Option<Libc>,
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arch = self.arch.registry_key();
        match self.os {
            Os::Linux => {
                let abi = match (self.arch, self.libc.unwrap_or(Libc::Glibc)) {
                    (Arch::Armv7l, Libc::Glibc) => "gnueabihf",
                    (Arch::Armv7l, Libc::Musl) => "musleabihf",
                    (_, Libc::Glibc) => "gnu",
                    (_, Libc::Musl) => "musl",
                };
                write!(f, "{arch}-linux-{abi}")
            }
            Os::Macos => {
                let darwin = match self.arch {
                    Arch::Aarch64 => "darwin20",
                    _ => "darwin14",
                };
                write!(f, "{arch}-apple-{darwin}")
            }
            Os::Windows => write!(f, "{arch}-w64-mingw32"),
            Os::Freebsd => write!(f, "{arch}-unknown-freebsd11.1"),
        }
    }
}

/// Platform key for a build artifact, including the platform-independent
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Platform-independent artifact
    Any,
    /// Artifact targeting one concrete platform
    Target(Triplet),
}

impl Platform {
    /// Canonical triplet string. The `Any` sentinel serializes as `"any"`.
    pub fn triplet(&self) -> String {
        match self {
            Platform::Any => "any".to_string(),
            Platform::Target(t) => t.to_string(),
        }
    }

    /// Convenience constructor for a concrete target.
    pub fn target(arch: Arch, os: Os, libc: Option<Libc>) -> Self {
        Platform::Target(Triplet { arch, os, libc })
    }

    /// OS family, if this is a concrete target.
    pub fn os(&self) -> Option<Os> {
        match self {
            Platform::Any => None,
            Platform::Target(t) => Some(t.os),
        }
    }

    /// Filename of the generated wrapper source for this platform, with the
    /// legacy `arm-` spelling normalized to `armv7l-`.
    pub fn wrapper_filename(&self) -> String {
        format!("{}.jl", normalize_arm_spelling(&self.triplet()))
    }

    /// Human-readable description used in generated readmes.
    pub fn description(&self) -> String {
        match self {
            Platform::Any => "Any".to_string(),
            Platform::Target(t) => {
                let os = match t.os {
                    Os::Linux => "Linux",
                    Os::Macos => "macOS",
                    Os::Windows => "Windows",
                    Os::Freebsd => "FreeBSD",
                };
                match t.libc {
                    Some(libc) => {
                        format!("{os} {} {{libc={}}}", t.arch.registry_key(), libc.registry_key())
                    }
                    None => format!("{os} {}", t.arch.registry_key()),
                }
            }
        }
    }

    /// Whether a release tarball filename refers to this platform. The
    /// legacy `arm-` spelling is accepted as a match for `armv7l-` targets.
    pub fn matches_filename(&self, filename: &str) -> bool {
        let triplet = self.triplet();
        if filename.contains(&triplet) {
            return true;
        }
        if let Some(stripped) = triplet.strip_prefix("armv7l-") {
            return filename.contains(&format!("arm-{stripped}"));
        }
        false
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triplet())
    }
}

impl PartialOrd for Platform {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Platform {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triplet().cmp(&other.triplet())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "any" {
            return Ok(Platform::Any);
        }
        let normalized = normalize_arm_spelling(s);
        let mut parts = normalized.splitn(2, '-');
        let arch = match parts.next() {
            Some("x86_64") => Arch::X86_64,
            Some("i686") => Arch::I686,
            Some("aarch64") => Arch::Aarch64,
            Some("armv7l") => Arch::Armv7l,
            Some("powerpc64le") => Arch::Powerpc64le,
            _ => return Err(Error::InvalidTriplet(s.to_string())),
        };
        let rest = parts.next().unwrap_or_default();
        let (os, libc) = if let Some(abi) = rest.strip_prefix("linux-") {
            let libc = match abi {
                "gnu" | "gnueabihf" => Libc::Glibc,
                "musl" | "musleabihf" => Libc::Musl,
                _ => return Err(Error::InvalidTriplet(s.to_string())),
            };
            (Os::Linux, Some(libc))
        } else if rest.starts_with("apple-darwin") {
            (Os::Macos, None)
        } else if rest == "w64-mingw32" {
            (Os::Windows, None)
        } else if rest.starts_with("unknown-freebsd") {
            (Os::Freebsd, None)
        } else {
            return Err(Error::InvalidTriplet(s.to_string()));
        };
        Ok(Platform::Target(Triplet { arch, os, libc }))
    }
}

/// Substitutes the newer `armv7l-` spelling for the historical `arm-` prefix.
///
/// Older host runtimes spelled the hard-float ARM triplet `arm-linux-gnueabihf`;
/// newer ones spell it `armv7l-linux-gnueabihf`. Generated filenames always
/// use the newer spelling, and lookups accept both.
pub fn normalize_arm_spelling(triplet: &str) -> String {
    match triplet.strip_prefix("arm-") {
        Some(rest) => format!("armv7l-{rest}"),
        None => triplet.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triplet_round_trips() {
        let cases = [
            "x86_64-linux-gnu",
            "x86_64-linux-musl",
            "aarch64-linux-gnu",
            "armv7l-linux-gnueabihf",
            "armv7l-linux-musleabihf",
            "powerpc64le-linux-gnu",
            "x86_64-apple-darwin14",
            "aarch64-apple-darwin20",
            "x86_64-w64-mingw32",
            "i686-w64-mingw32",
            "x86_64-unknown-freebsd11.1",
            "any",
        ];
        for case in cases {
            let platform: Platform = case.parse().unwrap();
            assert_eq!(platform.triplet(), case, "round trip of {case}");
        }
    }

    #[test]
    fn legacy_arm_spelling_accepted() {
        let platform: Platform = "arm-linux-gnueabihf".parse().unwrap();
        assert_eq!(platform.triplet(), "armv7l-linux-gnueabihf");
        assert_eq!(platform.wrapper_filename(), "armv7l-linux-gnueabihf.jl");
        assert!(platform.matches_filename("Foo.v1.0.0.arm-linux-gnueabihf.tar.gz"));
        assert!(platform.matches_filename("Foo.v1.0.0.armv7l-linux-gnueabihf.tar.gz"));
    }

    #[test]
    fn unknown_triplet_rejected() {
        assert!("riscv64-linux-gnu".parse::<Platform>().is_err());
        assert!("x86_64".parse::<Platform>().is_err());
    }

    #[test]
    fn ordering_by_triplet() {
        let linux: Platform = "x86_64-linux-gnu".parse().unwrap();
        let mac: Platform = "x86_64-apple-darwin14".parse().unwrap();
        let mut v = vec![linux, mac, Platform::Any];
        v.sort();
        assert_eq!(v[0], Platform::Any);
        assert_eq!(v[1], mac);
        assert_eq!(v[2], linux);
    }
}
