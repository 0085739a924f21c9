//! Source trait - common interface for all descriptor sources.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use semver::Version;

use crate::core::PackageDescriptor;
use crate::core::{DependencyLocation, PackageDependency};
use crate::util::fs::canonicalize_or_normalize;

/// A loaded descriptor together with where it was found.
#[derive(Debug, Clone)]
pub struct PackageCandidate {
    pub descriptor: PackageDescriptor,

    /// The descriptor file
    pub manifest_path: PathBuf,

    /// The version this candidate is offered at: the declared version, the
    /// index directory's version, or `0.0.0` for unversioned local packages.
    pub version: Version,
}

impl PackageCandidate {
    pub fn new(descriptor: PackageDescriptor, manifest_path: PathBuf) -> Self {
        let version = descriptor.version_or_default();
        PackageCandidate {
            descriptor,
            manifest_path,
            version,
        }
    }

    /// Create a candidate with no file behind it.
    pub fn in_memory(descriptor: PackageDescriptor) -> Self {
        Self::new(descriptor, PathBuf::new())
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// The package directory, against which path dependencies resolve.
    pub fn root(&self) -> &Path {
        self.manifest_path.parent().unwrap_or(Path::new(""))
    }
}

/// Where a dependency points, normalized so that two spellings of the same
/// location compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationKey {
    Path(PathBuf),
    Url(String),
    Registry(String),
}

impl LocationKey {
    /// The location of `dep` as declared by the package rooted at `root`.
    pub fn of(dep: &PackageDependency, root: &Path) -> LocationKey {
        match &dep.location {
            DependencyLocation::Path { .. } => {
                let path = dep.resolved_path(root).unwrap_or_default();
                LocationKey::Path(canonicalize_or_normalize(&path))
            }
            DependencyLocation::SourceControl { url, .. } => {
                let trimmed = url.trim_end_matches('/');
                let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
                LocationKey::Url(trimmed.to_lowercase())
            }
            DependencyLocation::Registry { id, .. } => LocationKey::Registry(id.to_lowercase()),
        }
    }

    /// The location of a package loaded from `root`.
    pub fn for_root(root: &Path) -> LocationKey {
        LocationKey::Path(canonicalize_or_normalize(root))
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKey::Path(p) => write!(f, "path {}", p.display()),
            LocationKey::Url(u) => write!(f, "url {}", u),
            LocationKey::Registry(id) => write!(f, "registry {}", id),
        }
    }
}

/// A dependency name at a location.
///
/// Two requirements for one name at different locations are different
/// packages to the resolver; selecting both is a conflict. Without a
/// location, a name stands for the same package wherever it is required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    pub name: String,
    pub location: Option<LocationKey>,
}

impl PackageId {
    pub fn new(name: impl Into<String>, location: LocationKey) -> Self {
        PackageId {
            name: name.into(),
            location: Some(location),
        }
    }

    /// A package known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        PackageId {
            name: name.into(),
            location: None,
        }
    }

    /// The package `dep` points at, as declared by the package rooted at `root`.
    pub fn of(dep: &PackageDependency, root: &Path) -> Self {
        Self::new(&dep.name, LocationKey::of(dep, root))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A source of package descriptors.
pub trait Source {
    /// Get the source name for display.
    fn name(&self) -> &str;

    /// Check if this source can answer for the given dependency.
    fn supports(&self, dep: &PackageDependency) -> bool;

    /// Every candidate this source offers for a dependency, highest version
    /// first. An empty list means the source does not know the package.
    fn query(&mut self, dep: &PackageDependency) -> Result<Vec<PackageCandidate>>;
}
