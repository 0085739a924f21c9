//! Dependency resolution.
//!
//! This module implements PubGrub-based version resolution over package
//! descriptors. The resolver is pure and deterministic - all I/O happens
//! before resolution, in [`crate::sources`].

pub mod errors;
pub mod resolve;
pub mod version;

pub use errors::ResolveError;
pub use resolve::{BuildUnit, Resolve, ResolvedPackage};

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error as StdError;
use std::fmt;

use anyhow::{bail, Result};
use pubgrub::{
    DefaultStringReporter, Dependencies, DependencyProvider, DerivationTree,
    PackageResolutionStatistics, Range, Reporter,
};
use semver::Version;

use crate::core::{PackageDependency, PackageDescriptor};
use crate::sources::{LocationKey, PackageCandidate, PackageGraph, PackageId};

/// Custom error type for the resolver that implements std::error::Error.
#[derive(Debug)]
pub struct ResolverError(String);

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for ResolverError {}

/// Dependency provider for PubGrub resolution.
///
/// Packages are identified by name and, for packages loaded from disk, by
/// the location they are required from. Each requirement therefore only
/// sees the candidates at its own location.
pub struct PackageResolver {
    /// Available candidates by package
    candidates: BTreeMap<PackageId, Vec<PackageCandidate>>,

    /// Root package
    root: PackageCandidate,

    root_id: PackageId,

    /// Whether requirements are told apart by location
    located: bool,
}

impl PackageResolver {
    /// Create a resolver for a root package loaded from disk.
    pub fn new(root: PackageCandidate) -> Self {
        let root_id = PackageId::new(root.name(), LocationKey::for_root(root.root()));
        PackageResolver {
            candidates: BTreeMap::new(),
            root,
            root_id,
            located: true,
        }
    }

    /// Create a resolver that identifies packages by name alone.
    pub fn by_name(root: PackageCandidate) -> Self {
        let root_id = PackageId::named(root.name());
        PackageResolver {
            candidates: BTreeMap::new(),
            root,
            root_id,
            located: false,
        }
    }

    /// Add available candidates for a package.
    pub fn add_candidates(&mut self, id: PackageId, candidates: Vec<PackageCandidate>) {
        let id = if self.located {
            id
        } else {
            PackageId::named(id.name)
        };
        if id == self.root_id {
            return;
        }
        self.candidates.entry(id).or_default().extend(candidates);
    }

    /// Resolve dependencies and return the selected graph.
    ///
    /// Fails with [`ResolveError::CyclicDependency`] when the selected
    /// packages depend on each other in a loop, with
    /// [`ResolveError::PackageNotFound`] when a package that must be used
    /// has no descriptor at its location, and with
    /// [`ResolveError::VersionConflict`] when one name is required from
    /// different locations or no version satisfies every requirement.
    pub fn resolve(self) -> Result<Resolve> {
        self.check_self_dependencies()?;

        let root_name = self.root.name().to_string();
        let root_version = self.root.version.clone();
        tracing::debug!("resolving `{}` {}", root_name, root_version);

        let solution = match pubgrub::resolve(&self, self.root_id.clone(), root_version) {
            Ok(solution) => solution,
            Err(pubgrub::PubGrubError::NoSolution(tree)) => {
                if let Some(missing) = self.missing_package(&tree) {
                    return Err(missing.into());
                }
                let report = DefaultStringReporter::report(&tree);
                return Err(ResolveError::NoSolution { report }.into());
            }
            Err(e) => {
                bail!("dependency resolution error: {:?}", e);
            }
        };

        let mut selected: Vec<(PackageId, Version, PackageCandidate)> = solution
            .into_iter()
            .filter_map(|(id, version)| {
                let candidate = if id == self.root_id {
                    Some(&self.root)
                } else {
                    self.candidate(&id, &version)
                };
                candidate.map(|c| (id, version, c.clone()))
            })
            .collect();
        selected.sort_by(|a, b| a.0.cmp(&b.0));

        let packages: Vec<_> = selected
            .iter()
            .map(|(id, _, candidate)| (id.name.clone(), candidate.clone()))
            .collect();
        self.check_locations(&packages)?;

        let mut resolve = Resolve::new(root_name);
        for (id, version, candidate) in selected {
            tracing::debug!("selected `{}` {}", id.name, version);
            resolve.add_package(ResolvedPackage {
                name: id.name,
                version,
                candidate,
            });
        }

        // Add dependency edges
        for (name, candidate) in &packages {
            for dep in &candidate.descriptor.dependencies {
                resolve.add_edge(name, &dep.name);
            }
        }

        if let Some(cycle) = resolve.find_cycle() {
            return Err(ResolveError::CyclicDependency { cycle }.into());
        }

        Ok(resolve)
    }

    fn candidate(&self, id: &PackageId, version: &Version) -> Option<&PackageCandidate> {
        self.candidates
            .get(id)?
            .iter()
            .find(|c| &c.version == version)
    }

    /// The package a requirement of `requirer` points at.
    fn dependency_id(&self, dep: &PackageDependency, requirer: &PackageCandidate) -> PackageId {
        if self.located {
            PackageId::of(dep, requirer.root())
        } else {
            PackageId::named(&dep.name)
        }
    }

    /// Every candidate, the root first.
    fn all_candidates(&self) -> impl Iterator<Item = &PackageCandidate> {
        std::iter::once(&self.root).chain(self.candidates.values().flatten())
    }

    /// A package the failed resolution needed that has no descriptor at all.
    fn missing_package(
        &self,
        tree: &DerivationTree<PackageId, Range<Version>, String>,
    ) -> Option<ResolveError> {
        let missing = tree
            .packages()
            .into_iter()
            .filter(|id| {
                **id != self.root_id && self.candidates.get(*id).map_or(true, Vec::is_empty)
            })
            .min()?;

        self.all_candidates().find_map(|requirer| {
            requirer
                .descriptor
                .dependencies
                .iter()
                .find(|dep| self.dependency_id(dep, requirer) == *missing)
                .map(|dep| ResolveError::PackageNotFound {
                    package: missing.name.clone(),
                    requirer: requirer.name().to_string(),
                    location: LocationKey::of(dep, requirer.root()).to_string(),
                })
        })
    }

    /// PubGrub cannot express a package depending on itself, so report it
    /// up front.
    fn check_self_dependencies(&self) -> Result<(), ResolveError> {
        for candidate in self.all_candidates() {
            let name = candidate.name();
            if candidate.descriptor.dependencies.iter().any(|d| d.name == name) {
                return Err(ResolveError::CyclicDependency {
                    cycle: vec![name.to_string(), name.to_string()],
                });
            }
        }
        Ok(())
    }

    /// Every selected package must agree on where each name lives.
    fn check_locations(&self, packages: &[(String, PackageCandidate)]) -> Result<(), ResolveError> {
        let mut claims: BTreeMap<&str, Vec<(String, LocationKey)>> = BTreeMap::new();

        if !self.root.manifest_path.as_os_str().is_empty() {
            claims.entry(self.root.name()).or_default().push((
                format!("{} (root)", self.root.name()),
                LocationKey::for_root(self.root.root()),
            ));
        }

        for (name, candidate) in packages {
            for dep in &candidate.descriptor.dependencies {
                let claim = (name.clone(), LocationKey::of(dep, candidate.root()));
                let entry = claims.entry(dep.name.as_str()).or_default();
                if !entry.contains(&claim) {
                    entry.push(claim);
                }
            }
        }

        for (package, requirers) in claims {
            let locations: BTreeSet<&LocationKey> = requirers.iter().map(|(_, key)| key).collect();
            if locations.len() > 1 {
                return Err(ResolveError::VersionConflict {
                    package: package.to_string(),
                    requirements: requirers
                        .into_iter()
                        .map(|(requirer, key)| (requirer, format!("at {}", key)))
                        .collect(),
                });
            }
        }
        Ok(())
    }

    fn dependencies_of(
        &self,
        candidate: &PackageCandidate,
    ) -> Dependencies<PackageId, Range<Version>, String> {
        let deps = candidate
            .descriptor
            .dependencies
            .iter()
            .map(|dep| {
                let range = version::requirement_to_range(dep.location.requirement());
                (self.dependency_id(dep, candidate), range)
            })
            .collect();

        Dependencies::Available(deps)
    }
}

impl DependencyProvider for PackageResolver {
    type P = PackageId;
    type V = Version;
    type VS = Range<Version>;
    type M = String;
    type Err = ResolverError;
    type Priority = u32;

    fn prioritize(
        &self,
        package: &Self::P,
        _range: &Self::VS,
        _package_conflicts_counts: &PackageResolutionStatistics,
    ) -> Self::Priority {
        // Higher priority = resolved first
        // Prioritize packages with fewer available versions
        if let Some(candidates) = self.candidates.get(package) {
            (1000 - candidates.len().min(1000)) as u32
        } else {
            1000
        }
    }

    fn choose_version(
        &self,
        package: &Self::P,
        range: &Self::VS,
    ) -> Result<Option<Self::V>, Self::Err> {
        if *package == self.root_id {
            let version = self.root.version.clone();
            return Ok(range.contains(&version).then_some(version));
        }

        // Find the highest matching version
        let best = self
            .candidates
            .get(package)
            .and_then(|list| {
                list.iter()
                    .map(|c| &c.version)
                    .filter(|v| range.contains(v))
                    .max()
            })
            .cloned();

        Ok(best)
    }

    fn get_dependencies(
        &self,
        package: &Self::P,
        version: &Self::V,
    ) -> Result<Dependencies<Self::P, Self::VS, Self::M>, Self::Err> {
        if *package == self.root_id && version == &self.root.version {
            return Ok(self.dependencies_of(&self.root));
        }

        match self.candidate(package, version) {
            Some(candidate) => Ok(self.dependencies_of(candidate)),
            None => Ok(Dependencies::Unavailable(format!(
                "no descriptor for `{}` {}",
                package, version
            ))),
        }
    }
}

/// Resolve a loaded package graph.
pub fn resolve_graph(graph: &PackageGraph) -> Result<Resolve> {
    let mut resolver = PackageResolver::new(graph.root.clone());
    for (id, candidates) in &graph.candidates {
        resolver.add_candidates(id.clone(), candidates.clone());
    }
    resolver.resolve()
}

/// Resolve a root descriptor against in-memory candidate descriptors.
///
/// Candidates are keyed by their own name and offered at their declared
/// version (`0.0.0` when none is declared). Path dependencies are compared
/// lexically.
pub fn resolve_descriptors(
    root: &PackageDescriptor,
    candidates: &[PackageDescriptor],
) -> Result<Resolve> {
    let mut resolver = PackageResolver::by_name(PackageCandidate::in_memory(root.clone()));
    for descriptor in candidates {
        resolver.add_candidates(
            PackageId::named(&descriptor.name),
            vec![PackageCandidate::in_memory(descriptor.clone())],
        );
    }
    resolver.resolve()
}
