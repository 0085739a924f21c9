//! Package resolution operations.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::resolver::{resolve_graph, BuildUnit, Resolve};
use crate::sources::load_package_graph;

/// Options for resolving a package.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Local index directories for source-control and registry dependencies
    pub index_paths: Vec<PathBuf>,
}

/// Load the package at `manifest_path` with all of its dependencies and
/// resolve them.
pub fn resolve_package(manifest_path: &Path, opts: &ResolveOptions) -> Result<Resolve> {
    let graph = load_package_graph(manifest_path, &opts.index_paths)?;
    tracing::info!(
        "resolving {} package(s) for `{}`",
        graph.package_count(),
        graph.root.name()
    );

    resolve_graph(&graph)
        .with_context(|| format!("failed to resolve dependencies of `{}`", graph.root.name()))
}

/// A serializable view of a resolved build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub root: String,

    /// Packages in build order
    pub packages: Vec<PlannedPackage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<BuildUnit>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedPackage {
    pub name: String,
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,

    pub dependencies: Vec<String>,
}

/// Compute the build plan for a resolve.
pub fn build_plan(resolve: &Resolve, with_units: bool) -> Result<BuildPlan> {
    let order = resolve.build_order()?;

    let packages = order
        .iter()
        .filter_map(|name| resolve.package(name))
        .map(|pkg| {
            let manifest = &pkg.candidate.manifest_path;
            PlannedPackage {
                name: pkg.name.clone(),
                version: pkg.version.to_string(),
                manifest: (!manifest.as_os_str().is_empty()).then(|| manifest.clone()),
                dependencies: resolve.deps(&pkg.name).into_iter().map(String::from).collect(),
            }
        })
        .collect();

    let units = if with_units {
        Some(resolve.build_units()?)
    } else {
        None
    };

    Ok(BuildPlan {
        root: resolve.root().to_string(),
        packages,
        units,
    })
}

/// Render a build plan as text, one package per line.
pub fn format_plan(plan: &BuildPlan) -> String {
    let mut out = String::new();

    for (i, pkg) in plan.packages.iter().enumerate() {
        let _ = write!(out, "{:>3}. {} v{}", i + 1, pkg.name, pkg.version);
        if pkg.name == plan.root {
            out.push_str(" (root)");
        }
        out.push('\n');
    }

    if let Some(units) = &plan.units {
        out.push_str("\nbuild units:\n");
        for unit in units {
            let _ = writeln!(out, "  {}/{}", unit.package, unit.target);
        }
    }

    out
}
