//! Dependency specification.
//!
//! A dependency names another package and says where to find it: a local
//! directory, a source-control URL, or a registry identity. The last two
//! carry a version requirement.

use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Serialize;
use url::Url;

/// Version requirement for source-control and registry dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionRequirement {
    /// `from: "1.2.0"` - compatible up to the next major version
    UpToNextMajor(Version),
    /// `.upToNextMinor(from: "1.2.0")`
    UpToNextMinor(Version),
    /// `exact: "1.2.0"`
    Exact(Version),
    /// `"1.0.0"..<"2.0.0"`
    Range { lower: Version, upper: Version },
    /// `branch: "main"` - not version-resolvable
    Branch(String),
    /// `revision: "abc123"` - not version-resolvable
    Revision(String),
}

impl VersionRequirement {
    /// Whether this requirement constrains versions (as opposed to naming a
    /// branch or revision).
    pub fn is_versioned(&self) -> bool {
        !matches!(
            self,
            VersionRequirement::Branch(_) | VersionRequirement::Revision(_)
        )
    }

    /// Check whether a version satisfies this requirement. Branch and
    /// revision requirements accept any version.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionRequirement::UpToNextMajor(min) => {
                version >= min && version < &Version::new(min.major + 1, 0, 0)
            }
            VersionRequirement::UpToNextMinor(min) => {
                version >= min && version < &Version::new(min.major, min.minor + 1, 0)
            }
            VersionRequirement::Exact(v) => version == v,
            VersionRequirement::Range { lower, upper } => version >= lower && version < upper,
            VersionRequirement::Branch(_) | VersionRequirement::Revision(_) => true,
        }
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRequirement::UpToNextMajor(v) => write!(f, "from {}", v),
            VersionRequirement::UpToNextMinor(v) => write!(f, "up to next minor from {}", v),
            VersionRequirement::Exact(v) => write!(f, "exactly {}", v),
            VersionRequirement::Range { lower, upper } => write!(f, "{}..<{}", lower, upper),
            VersionRequirement::Branch(b) => write!(f, "branch {}", b),
            VersionRequirement::Revision(r) => write!(f, "revision {}", r),
        }
    }
}

/// Where a dependency is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum DependencyLocation {
    /// A directory on the local filesystem, relative to the depending
    /// package unless absolute.
    Path { path: PathBuf },
    /// A source-control repository URL.
    SourceControl {
        url: String,
        requirement: VersionRequirement,
    },
    /// A registry identity of the form `scope.name`.
    Registry {
        id: String,
        requirement: VersionRequirement,
    },
}

impl DependencyLocation {
    pub fn is_path(&self) -> bool {
        matches!(self, DependencyLocation::Path { .. })
    }

    /// The version requirement, if the location has one.
    pub fn requirement(&self) -> Option<&VersionRequirement> {
        match self {
            DependencyLocation::Path { .. } => None,
            DependencyLocation::SourceControl { requirement, .. }
            | DependencyLocation::Registry { requirement, .. } => Some(requirement),
        }
    }

    /// The name a dependency gets when none is given explicitly.
    pub fn default_name(&self) -> Option<String> {
        match self {
            DependencyLocation::Path { path } => path_identity(path),
            DependencyLocation::SourceControl { url, .. } => url_identity(url),
            DependencyLocation::Registry { id, .. } => registry_identity(id),
        }
    }
}

impl fmt::Display for DependencyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyLocation::Path { path } => write!(f, "path {}", path.display()),
            DependencyLocation::SourceControl { url, requirement } => {
                write!(f, "{} ({})", url, requirement)
            }
            DependencyLocation::Registry { id, requirement } => {
                write!(f, "registry {} ({})", id, requirement)
            }
        }
    }
}

/// A dependency on another package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDependency {
    pub name: String,
    pub location: DependencyLocation,
}

impl PackageDependency {
    /// Create a path dependency.
    pub fn path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        PackageDependency {
            name: name.into(),
            location: DependencyLocation::Path { path: path.into() },
        }
    }

    /// Create a dependency with an explicit location.
    pub fn new(name: impl Into<String>, location: DependencyLocation) -> Self {
        PackageDependency {
            name: name.into(),
            location,
        }
    }

    /// Resolve a path dependency against the directory of the depending
    /// package. Returns `None` for non-path dependencies.
    pub fn resolved_path(&self, package_root: &Path) -> Option<PathBuf> {
        match &self.location {
            DependencyLocation::Path { path } if path.is_absolute() => {
                Some(crate::util::fs::normalize_path(path))
            }
            DependencyLocation::Path { path } => {
                Some(crate::util::fs::normalize_path(&package_root.join(path)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for PackageDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}

fn path_identity(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn url_identity(url: &str) -> Option<String> {
    let last = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        // scp-like `git@host:owner/repo.git`
        Err(_) => url
            .rsplit(['/', ':'])
            .find(|s| !s.is_empty())
            .map(str::to_string),
    }?;

    Some(last.strip_suffix(".git").unwrap_or(&last).to_string())
}

fn registry_identity(id: &str) -> Option<String> {
    match id.split_once('.') {
        Some((scope, name)) if !scope.is_empty() && !name.is_empty() => Some(name.to_string()),
        _ => None,
    }
}

/// Check that a registry identity has the `scope.name` form.
pub fn is_valid_registry_id(id: &str) -> bool {
    registry_identity(id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let path = DependencyLocation::Path {
            path: PathBuf::from("../plugins/path_provider_foundation"),
        };
        assert_eq!(path.default_name().as_deref(), Some("path_provider_foundation"));

        let git = DependencyLocation::SourceControl {
            url: "https://github.com/apple/swift-log.git".to_string(),
            requirement: VersionRequirement::UpToNextMajor(Version::new(1, 5, 0)),
        };
        assert_eq!(git.default_name().as_deref(), Some("swift-log"));

        let scp = DependencyLocation::SourceControl {
            url: "git@github.com:owner/PDFKitCompat.git".to_string(),
            requirement: VersionRequirement::Branch("main".to_string()),
        };
        assert_eq!(scp.default_name().as_deref(), Some("PDFKitCompat"));

        let registry = DependencyLocation::Registry {
            id: "mona.LinkedList".to_string(),
            requirement: VersionRequirement::Exact(Version::new(1, 0, 0)),
        };
        assert_eq!(registry.default_name().as_deref(), Some("LinkedList"));
    }

    #[test]
    fn test_requirement_matching() {
        let from = VersionRequirement::UpToNextMajor(Version::new(1, 2, 0));
        assert!(from.matches(&Version::new(1, 9, 3)));
        assert!(!from.matches(&Version::new(2, 0, 0)));
        assert!(!from.matches(&Version::new(1, 1, 0)));

        let minor = VersionRequirement::UpToNextMinor(Version::new(1, 2, 0));
        assert!(minor.matches(&Version::new(1, 2, 7)));
        assert!(!minor.matches(&Version::new(1, 3, 0)));

        let range = VersionRequirement::Range {
            lower: Version::new(1, 0, 0),
            upper: Version::new(1, 4, 0),
        };
        assert!(range.matches(&Version::new(1, 3, 9)));
        assert!(!range.matches(&Version::new(1, 4, 0)));

        assert!(VersionRequirement::Branch("main".into()).matches(&Version::new(0, 0, 1)));
    }

    #[test]
    fn test_resolved_path_is_normalized() {
        let dep = PackageDependency::path("core", "../core");
        let resolved = dep.resolved_path(Path::new("/work/plugins/app")).unwrap();
        assert_eq!(resolved, PathBuf::from("/work/plugins/core"));
    }

    #[test]
    fn test_registry_id_validation() {
        assert!(is_valid_registry_id("mona.LinkedList"));
        assert!(!is_valid_registry_id("LinkedList"));
        assert!(!is_valid_registry_id(".LinkedList"));
    }
}
