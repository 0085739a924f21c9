//! `plugdesc tree` command

use anyhow::Result;

use super::{manifest, resolve_options};
use crate::cli::TreeArgs;
use plugdesc::ops::{format_tree, resolve_package};
use plugdesc::util::GlobalContext;

pub fn execute(args: TreeArgs, ctx: &GlobalContext) -> Result<()> {
    let manifest_path = manifest(ctx, args.path.as_deref())?;
    let resolve = resolve_package(&manifest_path, &resolve_options(ctx, &args.index))?;

    print!("{}", format_tree(&resolve, args.depth));
    Ok(())
}
