//! Command implementations

pub mod check;
pub mod completions;
pub mod generate;
pub mod resolve;
pub mod show;
pub mod tree;

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::IndexArgs;
use plugdesc::ops::ResolveOptions;
use plugdesc::util::GlobalContext;

/// Resolution options from configuration, with `--index` directories
/// searched first.
pub(crate) fn resolve_options(ctx: &GlobalContext, args: &IndexArgs) -> ResolveOptions {
    let mut index_paths: Vec<PathBuf> = args.index.iter().map(|p| ctx.cwd().join(p)).collect();
    index_paths.extend(ctx.config().resolve.index_paths);
    ResolveOptions { index_paths }
}

/// The descriptor a command operates on.
pub(crate) fn manifest(ctx: &GlobalContext, path: Option<&std::path::Path>) -> Result<PathBuf> {
    let manifest = ctx.find_manifest(path)?;
    tracing::debug!("using descriptor {}", manifest.display());
    Ok(manifest)
}
