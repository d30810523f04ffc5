//! Dependency model and project manifest construction.
//!
//! Builds the `Project.toml` manifest accompanying a generated wrapper
//! package: name, identifier, pinned version, dependency identifier map, and
//! compatibility constraints. Build-only dependencies are unrepresentable in
//! the manifest builder's argument type; passing one is a construction-time
//! error at the call site, never a silent filter.

use std::collections::BTreeMap;

use semver::{Op, Version, VersionReq};
use toml_edit::{DocumentMut, Item, Table, value};
use uuid::{Uuid, uuid};

use crate::forge::error::{Error, Result};
use crate::forge::identity::{derive_identifier, wrapper_identifier, wrapper_name};

/// Version constraint carried by a dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Any published version is acceptable
    Any,
    /// Exactly one version
    Exact(Version),
    /// A version range
    Range(VersionReq),
}

impl Constraint {
    /// Renders the compatibility entry for this constraint, or `None` when
    /// the constraint is trivial.
    ///
    /// Exact versions render as `"=X.Y.Z"`, dropping any build or prerelease
    /// detail. Ranges pinned to a single version collapse to the same
    /// exact-equality form; all other ranges render in their natural string
    /// form.
    pub fn compat_entry(&self) -> Option<String> {
        match self {
            Constraint::Any => None,
            Constraint::Exact(v) => Some(format!("={}.{}.{}", v.major, v.minor, v.patch)),
            Constraint::Range(req) => {
                if let [cmp] = req.comparators.as_slice()
                    && cmp.op == Op::Exact
                    && let (Some(minor), Some(patch)) = (cmp.minor, cmp.patch)
                {
                    return Some(format!("={}.{}.{}", cmp.major, minor, patch));
                }
                Some(req.to_string())
            }
        }
    }
}

/// Whether a dependency is needed at runtime or only while building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// Needed by the generated package at load time; appears in the manifest
    Runtime,
    /// Needed only while producing the binaries; never appears in the manifest
    Build,
}

/// A dependency on a sibling wrapper package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Full package name, e.g. `Zlib_jll`
    pub name: String,
    /// Version constraint
    pub constraint: Constraint,
    /// Runtime or build-only
    pub kind: DependencyKind,
}

#[allow(dead_code)] // Public API - constructors preserved for external consumers
impl Dependency {
    /// Runtime dependency with no version constraint.
    pub fn runtime(name: &str) -> Self {
        Dependency {
            name: name.to_string(),
            constraint: Constraint::Any,
            kind: DependencyKind::Runtime,
        }
    }

    /// Build-only dependency with no version constraint.
    pub fn build_only(name: &str) -> Self {
        Dependency {
            name: name.to_string(),
            constraint: Constraint::Any,
            kind: DependencyKind::Build,
        }
    }

    /// Derived identifier of the dependency package.
    pub fn identifier(&self) -> Uuid {
        derive_identifier(&self.name)
    }
}

/// A dependency statically known to be a runtime dependency.
///
/// The manifest builder accepts only this type, so a build-only dependency
/// cannot reach it. Conversion from a plain [`Dependency`] is fallible and
/// produces the construction-time rejection for dynamic call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeDependency(Dependency);

impl RuntimeDependency {
    /// Full package name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Version constraint.
    pub fn constraint(&self) -> &Constraint {
        &self.0.constraint
    }

    /// Derived identifier of the dependency package.
    pub fn identifier(&self) -> Uuid {
        self.0.identifier()
    }
}

impl TryFrom<Dependency> for RuntimeDependency {
    type Error = Error;

    fn try_from(dep: Dependency) -> Result<Self> {
        match dep.kind {
            DependencyKind::Runtime => Ok(RuntimeDependency(dep)),
            DependencyKind::Build => Err(Error::BuildOnlyDependency(dep.name)),
        }
    }
}

/// Host standard-library packages resolvable by name.
///
/// Every generated package depends on the dynamic-library-loading stdlib and
/// the package-manager runtime, regardless of what the wrapped binary needs.
const STDLIBS: &[(&str, Uuid)] = &[
    ("Artifacts", uuid!("56f22d72-fd6d-98f1-02f0-08ddc0907c33")),
    ("Dates", uuid!("ade2ca70-3891-5945-98fb-dc099432e06a")),
    ("Libdl", uuid!("8f399da3-3557-5675-b5ff-fb832c97cbdb")),
    ("Pkg", uuid!("44cfe95a-1eb2-52ea-b672-e2afdf69b78f")),
    ("SHA", uuid!("ea8e919c-243c-51af-8825-aaa63cd721ce")),
    ("TOML", uuid!("fa267f1f-6049-4f14-aa54-33bafae1ed76")),
    ("Test", uuid!("8dfed614-e22c-5e08-85e1-65c5234f0b40")),
];

/// Looks up a host standard-library package identifier by name.
pub fn stdlib_identifier(name: &str) -> Option<Uuid> {
    STDLIBS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, uuid)| *uuid)
}

/// Builds the project manifest for a wrapper package.
///
/// The manifest carries the wrapper name, its derived identifier, the pinned
/// version string, a dependency-name-to-identifier map, and compatibility
/// constraints. The `Libdl` and `Pkg` standard libraries are always
/// injected, and a minimum-host-version compat entry (`julia`) is always
/// present.
pub fn build_project(
    src_name: &str,
    version: &Version,
    deps: &[RuntimeDependency],
    julia_compat: &str,
) -> Result<DocumentMut> {
    let mut doc = DocumentMut::new();
    doc["name"] = value(wrapper_name(src_name));
    doc["uuid"] = value(wrapper_identifier(src_name).to_string());
    doc["version"] = value(version.to_string());

    let mut dep_map: BTreeMap<String, String> = BTreeMap::new();
    for stdlib in ["Libdl", "Pkg"] {
        let uuid = stdlib_identifier(stdlib)
            .ok_or_else(|| Error::GenericError(format!("unknown stdlib {stdlib:?}")))?;
        dep_map.insert(stdlib.to_string(), uuid.to_string());
    }
    for dep in deps {
        dep_map.insert(dep.name().to_string(), dep.identifier().to_string());
    }

    let mut deps_table = Table::new();
    for (name, uuid) in &dep_map {
        deps_table[name.as_str()] = value(uuid.as_str());
    }
    doc["deps"] = Item::Table(deps_table);

    let mut compat_map: BTreeMap<String, String> = BTreeMap::new();
    compat_map.insert("julia".to_string(), julia_compat.to_string());
    for dep in deps {
        if let Some(entry) = dep.constraint().compat_entry() {
            compat_map.insert(dep.name().to_string(), entry);
        }
    }

    let mut compat_table = Table::new();
    for (name, entry) in &compat_map {
        compat_table[name.as_str()] = value(entry.as_str());
    }
    doc["compat"] = Item::Table(compat_table);

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned(name: &str, version: &str) -> RuntimeDependency {
        RuntimeDependency(Dependency {
            name: name.to_string(),
            constraint: Constraint::Exact(Version::parse(version).unwrap()),
            kind: DependencyKind::Runtime,
        })
    }

    #[test]
    fn build_only_rejected_at_construction() {
        let err = RuntimeDependency::try_from(Dependency::build_only("CMake_jll")).unwrap_err();
        assert!(matches!(err, Error::BuildOnlyDependency(name) if name == "CMake_jll"));
    }

    #[test]
    fn exact_constraint_renders_equality() {
        let c = Constraint::Exact(Version::parse("1.2.11+3").unwrap());
        assert_eq!(c.compat_entry().as_deref(), Some("=1.2.11"));
    }

    #[test]
    fn pinned_range_collapses_to_equality() {
        let c = Constraint::Range(VersionReq::parse("=1.2.11").unwrap());
        assert_eq!(c.compat_entry().as_deref(), Some("=1.2.11"));
    }

    #[test]
    fn general_range_renders_naturally() {
        let c = Constraint::Range(VersionReq::parse(">=1.2, <2").unwrap());
        assert_eq!(c.compat_entry().as_deref(), Some(">=1.2, <2"));
        assert_eq!(Constraint::Any.compat_entry(), None);
    }

    #[test]
    fn manifest_injects_fixed_runtime_deps() {
        let version = Version::parse("1.2.11+3").unwrap();
        let doc = build_project("Zlib", &version, &[], "1.0").unwrap();
        let deps = doc["deps"].as_table().unwrap();
        assert_eq!(
            deps["Libdl"].as_str(),
            Some("8f399da3-3557-5675-b5ff-fb832c97cbdb")
        );
        assert_eq!(
            deps["Pkg"].as_str(),
            Some("44cfe95a-1eb2-52ea-b672-e2afdf69b78f")
        );
        assert_eq!(deps.len(), 2);
        assert_eq!(doc["name"].as_str(), Some("Zlib_jll"));
        assert_eq!(doc["version"].as_str(), Some("1.2.11+3"));
        assert_eq!(
            doc["compat"].as_table().unwrap()["julia"].as_str(),
            Some("1.0")
        );
    }

    #[test]
    fn manifest_compat_for_pinned_dependency() {
        let version = Version::parse("4.1.0").unwrap();
        let deps = [
            pinned("Zlib_jll", "1.2.11"),
            RuntimeDependency(Dependency::runtime("Bzip2_jll")),
        ];
        let doc = build_project("FFMPEG", &version, &deps, "1.0").unwrap();
        let compat = doc["compat"].as_table().unwrap();
        assert_eq!(compat["Zlib_jll"].as_str(), Some("=1.2.11"));
        assert!(compat.get("Bzip2_jll").is_none());
        let dep_table = doc["deps"].as_table().unwrap();
        assert!(dep_table.get("Zlib_jll").is_some());
        assert!(dep_table.get("Bzip2_jll").is_some());
        assert_eq!(
            doc["uuid"].as_str(),
            Some("b22a6f82-2f65-5046-a5b2-351ab43fb4e5")
        );
    }
}
