//! Loading a package and everything it depends on.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::format;
use crate::sources::{IndexSource, LocationKey, PackageCandidate, PackageId, PathSource, Source};
use crate::util::fs::canonicalize_or_normalize;

/// The root package and every candidate for its transitive dependencies.
#[derive(Debug, Clone)]
pub struct PackageGraph {
    pub root: PackageCandidate,

    /// Candidates for each name at each location it is required from,
    /// highest version first. A location where nothing was found maps to an
    /// empty list.
    pub candidates: BTreeMap<PackageId, Vec<PackageCandidate>>,
}

impl PackageGraph {
    /// Candidates for a dependency name, across every location.
    pub fn candidates(&self, name: &str) -> Vec<&PackageCandidate> {
        self.candidates
            .iter()
            .filter(|(id, _)| id.name == name)
            .flat_map(|(_, list)| list)
            .collect()
    }

    /// Number of package locations with a descriptor (root included).
    pub fn package_count(&self) -> usize {
        self.candidates.values().filter(|list| !list.is_empty()).count() + 1
    }
}

/// Load the package at `manifest_path` and, breadth-first, the candidates
/// for all of its transitive dependencies.
///
/// Path dependencies resolve relative to the depending package's directory.
/// Source-control and registry dependencies are looked up in the index
/// directories. Every location a name is required from is loaded, including
/// ones only reached through versions the resolver may never select. A
/// location that holds nothing is recorded as empty and left for the
/// resolver to report if a selected package needs it.
pub fn load_package_graph(manifest_path: &Path, index_paths: &[PathBuf]) -> Result<PackageGraph> {
    let manifest_path = canonicalize_or_normalize(manifest_path);
    let root = PackageCandidate::new(format::load(&manifest_path)?, manifest_path);
    tracing::info!("loading dependencies of `{}`", root.name());

    let root_id = PackageId::new(root.name(), LocationKey::for_root(root.root()));
    let mut index = IndexSource::new(index_paths.to_vec());
    let mut candidates: BTreeMap<PackageId, Vec<PackageCandidate>> = BTreeMap::new();
    let mut queue = VecDeque::from([root.clone()]);

    while let Some(package) = queue.pop_front() {
        for dep in &package.descriptor.dependencies {
            let id = PackageId::of(dep, package.root());
            if id == root_id || candidates.contains_key(&id) {
                continue;
            }

            let found = match dep.resolved_path(package.root()) {
                Some(dir) => PathSource::new(dir).query(dep)?,
                None => index.query(dep)?,
            };

            if found.is_empty() {
                tracing::debug!(
                    "`{}` -> `{}`: nothing at {}",
                    package.name(),
                    dep.name,
                    LocationKey::of(dep, package.root())
                );
            } else {
                tracing::debug!(
                    "`{}` -> `{}`: {} candidate(s)",
                    package.name(),
                    dep.name,
                    found.len()
                );
            }
            queue.extend(found.iter().cloned());
            candidates.insert(id, found);
        }
    }

    Ok(PackageGraph { root, candidates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_package(dir: &Path, name: &str, deps: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join("Plugin.toml"),
            format!(
                "[package]\nname = \"{name}\"\n\n[platforms]\nios = \"12.0\"\n\n[products.{name}]\ntargets = [\"{name}\"]\n\n[dependencies]\n{deps}\n[targets.{name}]\n"
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_load_transitive_path_dependencies() {
        let tmp = TempDir::new().unwrap();
        write_package(&tmp.path().join("app"), "app", "pdfview = { path = \"../pdfview\" }\n");
        write_package(&tmp.path().join("pdfview"), "pdfview", "core = { path = \"../core\" }\n");
        write_package(&tmp.path().join("core"), "core", "");

        let graph =
            load_package_graph(&tmp.path().join("app").join("Plugin.toml"), &[]).unwrap();

        assert_eq!(graph.root.name(), "app");
        assert_eq!(graph.package_count(), 3);
        assert_eq!(graph.candidates("core")[0].name(), "core");
    }

    #[test]
    fn test_cycle_back_to_root_is_not_reloaded() {
        let tmp = TempDir::new().unwrap();
        write_package(&tmp.path().join("a"), "a", "b = { path = \"../b\" }\n");
        write_package(&tmp.path().join("b"), "b", "a = { path = \"../a\" }\n");

        let graph = load_package_graph(&tmp.path().join("a").join("Plugin.toml"), &[]).unwrap();
        assert_eq!(graph.package_count(), 2);
        assert!(graph.candidates("a").is_empty());
    }

    #[test]
    fn test_missing_dependency_is_recorded_empty() {
        let tmp = TempDir::new().unwrap();
        write_package(&tmp.path().join("app"), "app", "ghost = { path = \"../ghost\" }\n");

        let graph =
            load_package_graph(&tmp.path().join("app").join("Plugin.toml"), &[]).unwrap();
        assert_eq!(graph.package_count(), 1);
        assert!(graph.candidates("ghost").is_empty());
        assert_eq!(graph.candidates.len(), 1);
    }

    #[test]
    fn test_every_required_location_is_loaded() {
        let tmp = TempDir::new().unwrap();
        write_package(
            &tmp.path().join("app"),
            "app",
            "pdfview = { path = \"../pdfview\" }\ncore = { path = \"../core\" }\n",
        );
        write_package(
            &tmp.path().join("pdfview"),
            "pdfview",
            "core = { path = \"../vendor/core\" }\n",
        );
        write_package(&tmp.path().join("core"), "core", "");
        write_package(&tmp.path().join("vendor").join("core"), "core", "");

        let graph =
            load_package_graph(&tmp.path().join("app").join("Plugin.toml"), &[]).unwrap();
        assert_eq!(graph.candidates("core").len(), 2);
        assert_eq!(graph.package_count(), 4);
    }
}
