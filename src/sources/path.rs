//! Path source - packages in local directories.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::workspace::{find_manifest, ManifestError};
use crate::core::PackageDependency;
use crate::format;
use crate::sources::{PackageCandidate, Source};

/// A source for a package in a local directory.
pub struct PathSource {
    /// The package directory
    path: PathBuf,

    /// Cached candidate
    package: Option<PackageCandidate>,
}

impl PathSource {
    /// Create a new path source.
    pub fn new(path: PathBuf) -> Self {
        PathSource {
            path,
            package: None,
        }
    }

    /// Load the descriptor in the directory. Returns `None` when the
    /// directory does not exist or holds no descriptor.
    pub fn load(&mut self) -> Result<Option<&PackageCandidate>> {
        if self.package.is_none() {
            let manifest_path = match find_manifest(&self.path) {
                Ok(p) => p,
                Err(ManifestError::NotFound { .. }) => {
                    tracing::debug!("no descriptor in {}", self.path.display());
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            let descriptor = format::load(&manifest_path)?;
            self.package = Some(PackageCandidate::new(descriptor, manifest_path));
        }

        Ok(self.package.as_ref())
    }
}

impl Source for PathSource {
    fn name(&self) -> &str {
        "path"
    }

    fn supports(&self, dep: &PackageDependency) -> bool {
        dep.location.is_path()
    }

    fn query(&mut self, dep: &PackageDependency) -> Result<Vec<PackageCandidate>> {
        if !self.supports(dep) {
            return Ok(vec![]);
        }

        let path = self.path.clone();
        let Some(candidate) = self.load()? else {
            return Ok(vec![]);
        };

        if candidate.name() != dep.name {
            tracing::warn!(
                "dependency `{}` points at {}, which declares package `{}`",
                dep.name,
                path.display(),
                candidate.name()
            );
        }

        Ok(vec![candidate.clone()])
    }
}
