//! Resolve - the selected package graph.
//!
//! Once created, a Resolve is read-only. Edges point from a package to the
//! packages it depends on.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use semver::Version;
use serde::Serialize;

use crate::core::TargetDependency;
use crate::resolver::ResolveError;
use crate::sources::PackageCandidate;

/// A package with the version selected for it.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    /// The name the package is depended on by
    pub name: String,
    pub version: Version,
    pub candidate: PackageCandidate,
}

/// One target to build, in build order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildUnit {
    pub package: String,
    pub target: String,
}

/// The resolved dependency graph.
#[derive(Debug, Clone)]
pub struct Resolve {
    /// Name of the root package
    root: String,

    /// Package graph
    graph: DiGraph<String, ()>,

    /// Map from package name to node index
    nodes: HashMap<String, NodeIndex>,

    /// Selected packages by name
    packages: BTreeMap<String, ResolvedPackage>,
}

impl Resolve {
    /// Create an empty Resolve for the given root package.
    pub fn new(root: impl Into<String>) -> Self {
        Resolve {
            root: root.into(),
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            packages: BTreeMap::new(),
        }
    }

    /// Add a package to the resolve.
    pub fn add_package(&mut self, package: ResolvedPackage) {
        if self.nodes.contains_key(&package.name) {
            return;
        }

        let node = self.graph.add_node(package.name.clone());
        self.nodes.insert(package.name.clone(), node);
        self.packages.insert(package.name.clone(), package);
    }

    /// Add a dependency edge: `from` depends on `to`.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if let (Some(&from_node), Some(&to_node)) = (self.nodes.get(from), self.nodes.get(to)) {
            if !self.graph.contains_edge(from_node, to_node) {
                self.graph.add_edge(from_node, to_node, ());
            }
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn package(&self, name: &str) -> Option<&ResolvedPackage> {
        self.packages.get(name)
    }

    /// Iterate over all packages, by name.
    pub fn packages(&self) -> impl Iterator<Item = &ResolvedPackage> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Direct dependencies of a package, sorted by name.
    pub fn deps(&self, name: &str) -> Vec<&str> {
        let Some(&node) = self.nodes.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// A dependency cycle, if the graph has one. The first package is
    /// repeated at the end (`a -> b -> a`).
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        find_cycle(&self.graph)
    }

    /// Packages in build order: dependencies before dependents, ties broken
    /// by name.
    pub fn build_order(&self) -> Result<Vec<String>, ResolveError> {
        topo_sort(&self.graph).map_err(|cycle| ResolveError::CyclicDependency { cycle })
    }

    /// Targets in build order. Packages come in [`build_order`], and the
    /// targets of one package are ordered by their dependencies on each
    /// other. Test targets are not build units.
    ///
    /// [`build_order`]: Resolve::build_order
    pub fn build_units(&self) -> Result<Vec<BuildUnit>, ResolveError> {
        let mut units = Vec::new();

        for name in self.build_order()? {
            let Some(package) = self.packages.get(&name) else {
                continue;
            };
            let descriptor = &package.candidate.descriptor;

            let mut graph = DiGraph::<String, ()>::new();
            let mut nodes = HashMap::new();
            for target in descriptor.targets.iter().filter(|t| !t.is_test()) {
                nodes.insert(target.name.as_str(), graph.add_node(target.name.clone()));
            }

            for target in descriptor.targets.iter().filter(|t| !t.is_test()) {
                let from = nodes[target.name.as_str()];
                for dep in &target.dependencies {
                    let local = match dep {
                        TargetDependency::Target { name } | TargetDependency::ByName { name } => {
                            nodes.get(name.as_str())
                        }
                        TargetDependency::Product { .. } => None,
                    };
                    if let Some(&to) = local {
                        if !graph.contains_edge(from, to) {
                            graph.add_edge(from, to, ());
                        }
                    }
                }
            }

            let order = topo_sort(&graph).map_err(|cycle| ResolveError::CyclicDependency {
                cycle: cycle
                    .into_iter()
                    .map(|target| format!("{}/{}", name, target))
                    .collect(),
            })?;

            units.extend(order.into_iter().map(|target| BuildUnit {
                package: name.clone(),
                target,
            }));
        }

        Ok(units)
    }
}

/// Kahn's algorithm over a graph whose edges point at dependencies.
/// Returns the nodes with dependencies first, ties broken by name, or the
/// cycle that prevents an order.
fn topo_sort(graph: &DiGraph<String, ()>) -> Result<Vec<String>, Vec<String>> {
    let mut remaining: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|n| (n, graph.neighbors(n).collect::<HashSet<_>>().len()))
        .collect();

    let mut ready: BTreeSet<(&str, NodeIndex)> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(&n, _)| (graph[n].as_str(), n))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some((name, node)) = ready.pop_first() {
        order.push(name.to_string());

        let dependents: HashSet<NodeIndex> = graph
            .neighbors_directed(node, Direction::Incoming)
            .collect();
        for dependent in dependents {
            if let Some(count) = remaining.get_mut(&dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert((graph[dependent].as_str(), dependent));
                }
            }
        }
    }

    if order.len() == graph.node_count() {
        Ok(order)
    } else {
        Err(find_cycle(graph).unwrap_or_default())
    }
}

/// The cycle through the smallest-named node that lies on any cycle.
fn find_cycle(graph: &DiGraph<String, ()>) -> Option<Vec<String>> {
    let mut on_cycle: Vec<(NodeIndex, HashSet<NodeIndex>)> = Vec::new();

    for scc in tarjan_scc(graph) {
        if scc.len() > 1 {
            let members: HashSet<NodeIndex> = scc.iter().copied().collect();
            for &n in &scc {
                on_cycle.push((n, members.clone()));
            }
        } else if graph.contains_edge(scc[0], scc[0]) {
            on_cycle.push((scc[0], HashSet::from([scc[0]])));
        }
    }

    let (start, members) = on_cycle
        .into_iter()
        .min_by(|a, b| graph[a.0].cmp(&graph[b.0]))?;

    let mut path = vec![start];
    let mut visited = HashSet::from([start]);
    if !walk_back_to(graph, start, start, &members, &mut visited, &mut path) {
        return None;
    }

    let mut cycle: Vec<String> = path.iter().map(|&n| graph[n].clone()).collect();
    cycle.push(graph[start].clone());
    Some(cycle)
}

/// Depth-first walk inside one strongly connected component, following
/// neighbors in name order, until an edge leads back to `start`.
fn walk_back_to(
    graph: &DiGraph<String, ()>,
    node: NodeIndex,
    start: NodeIndex,
    members: &HashSet<NodeIndex>,
    visited: &mut HashSet<NodeIndex>,
    path: &mut Vec<NodeIndex>,
) -> bool {
    let mut next: Vec<NodeIndex> = graph
        .neighbors(node)
        .filter(|n| members.contains(n))
        .collect();
    next.sort_by(|a, b| graph[*a].cmp(&graph[*b]));
    next.dedup();

    for n in next {
        if n == start {
            return true;
        }
        if visited.insert(n) {
            path.push(n);
            if walk_back_to(graph, n, start, members, visited, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PackageDescriptor, Target};

    fn package(name: &str) -> ResolvedPackage {
        package_with(PackageDescriptor::new(name).with_target(Target::new(name)))
    }

    fn package_with(descriptor: PackageDescriptor) -> ResolvedPackage {
        ResolvedPackage {
            name: descriptor.name.clone(),
            version: Version::new(0, 0, 0),
            candidate: PackageCandidate::in_memory(descriptor),
        }
    }

    #[test]
    fn test_resolve_basic() {
        let mut resolve = Resolve::new("a");
        resolve.add_package(package("a"));
        resolve.add_package(package("b"));
        resolve.add_edge("a", "b");

        assert_eq!(resolve.len(), 2);
        assert_eq!(resolve.deps("a"), vec!["b"]);
        assert_eq!(resolve.deps("b"), Vec::<&str>::new());
    }

    #[test]
    fn test_build_order_dependencies_first_ties_by_name() {
        let mut resolve = Resolve::new("app");
        for name in ["app", "zeta", "alpha", "core"] {
            resolve.add_package(package(name));
        }
        resolve.add_edge("app", "zeta");
        resolve.add_edge("app", "alpha");
        resolve.add_edge("zeta", "core");
        resolve.add_edge("alpha", "core");

        assert_eq!(
            resolve.build_order().unwrap(),
            vec!["core", "alpha", "zeta", "app"]
        );
        assert_eq!(resolve.deps("app"), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_two_package_cycle() {
        let mut resolve = Resolve::new("a");
        resolve.add_package(package("a"));
        resolve.add_package(package("b"));
        resolve.add_edge("a", "b");
        resolve.add_edge("b", "a");

        let err = resolve.build_order().unwrap_err();
        assert_eq!(
            err,
            ResolveError::CyclicDependency {
                cycle: vec!["a".into(), "b".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_self_cycle() {
        let mut resolve = Resolve::new("a");
        resolve.add_package(package("a"));
        resolve.add_edge("a", "a");

        assert_eq!(
            resolve.find_cycle(),
            Some(vec!["a".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn test_build_units_order_local_targets() {
        let desc = PackageDescriptor::new("pdf")
            .with_target(Target::new("PdfView").with_dependency(TargetDependency::Target {
                name: "PdfCore".to_string(),
            }))
            .with_target(Target::new("PdfCore"))
            .with_target({
                let mut t = Target::new("PdfTests");
                t.kind = crate::core::TargetKind::Test;
                t
            });

        let mut resolve = Resolve::new("pdf");
        resolve.add_package(package_with(desc));

        let units = resolve.build_units().unwrap();
        let targets: Vec<&str> = units.iter().map(|u| u.target.as_str()).collect();
        assert_eq!(targets, vec!["PdfCore", "PdfView"]);
    }

    #[test]
    fn test_target_cycle_is_reported() {
        let desc = PackageDescriptor::new("pdf")
            .with_target(Target::new("a").with_dependency(TargetDependency::ByName {
                name: "b".to_string(),
            }))
            .with_target(Target::new("b").with_dependency(TargetDependency::Target {
                name: "a".to_string(),
            }));

        let mut resolve = Resolve::new("pdf");
        resolve.add_package(package_with(desc));

        let err = resolve.build_units().unwrap_err();
        assert_eq!(err.to_string(), "cyclic dependency: pdf/a -> pdf/b -> pdf/a");
    }
}
