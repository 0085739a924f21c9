//! Index source - local directories of published descriptors.
//!
//! An index is laid out as `<index>/<package-name>/<version>/<descriptor>`.
//! Every version directory holding a descriptor is a candidate; source
//! control and registry dependencies are answered from here, never from
//! the network.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;

use crate::core::workspace::{find_manifest, ManifestError};
use crate::core::PackageDependency;
use crate::format;
use crate::resolver::version::parse_version_lenient;
use crate::sources::{PackageCandidate, Source};

/// A source backed by one or more local index directories.
pub struct IndexSource {
    /// Index roots, searched in order
    roots: Vec<PathBuf>,

    /// Candidates already loaded, by package name
    cache: HashMap<String, Vec<PackageCandidate>>,
}

impl IndexSource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        IndexSource {
            roots,
            cache: HashMap::new(),
        }
    }

    /// Load every published version of `name`, highest first. The first
    /// index that has a given version wins.
    fn load_versions(&self, name: &str) -> Result<Vec<PackageCandidate>> {
        let mut found: Vec<PackageCandidate> = Vec::new();

        for root in &self.roots {
            let package_dir = root.join(name);
            if !package_dir.is_dir() {
                continue;
            }

            for (version, dir) in version_dirs(&package_dir)? {
                if found.iter().any(|c| c.version == version) {
                    tracing::debug!(
                        "`{}` {} in {} is shadowed by an earlier index",
                        name,
                        version,
                        root.display()
                    );
                    continue;
                }

                let manifest_path = match find_manifest(&dir) {
                    Ok(p) => p,
                    Err(ManifestError::NotFound { .. }) => {
                        tracing::warn!("index entry {} has no descriptor", dir.display());
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                let mut descriptor = format::load(&manifest_path)?;
                match &descriptor.version {
                    Some(declared) if *declared != version => {
                        tracing::warn!(
                            "{} declares version {} but is published as {}",
                            manifest_path.display(),
                            declared,
                            version
                        );
                    }
                    _ => {}
                }
                descriptor.version = Some(version.clone());

                found.push(PackageCandidate::new(descriptor, manifest_path).with_version(version));
            }
        }

        found.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(found)
    }
}

impl Source for IndexSource {
    fn name(&self) -> &str {
        "index"
    }

    fn supports(&self, dep: &PackageDependency) -> bool {
        !dep.location.is_path()
    }

    fn query(&mut self, dep: &PackageDependency) -> Result<Vec<PackageCandidate>> {
        if !self.supports(dep) {
            return Ok(vec![]);
        }

        if let Some(cached) = self.cache.get(&dep.name) {
            return Ok(cached.clone());
        }

        let candidates = self.load_versions(&dep.name)?;
        tracing::debug!(
            "index has {} version(s) of `{}`",
            candidates.len(),
            dep.name
        );
        self.cache.insert(dep.name.clone(), candidates.clone());
        Ok(candidates)
    }
}

/// Version-named subdirectories of a package directory.
fn version_dirs(package_dir: &Path) -> Result<Vec<(Version, PathBuf)>> {
    let mut out = Vec::new();

    for entry in std::fs::read_dir(package_dir)
        .with_context(|| format!("failed to read index directory: {}", package_dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(version) = file_name.to_str().and_then(parse_version_lenient) else {
            tracing::debug!("skipping non-version directory {}", entry.path().display());
            continue;
        };
        out.push((version, entry.path()));
    }

    Ok(out)
}
