//! `plugdesc resolve` command

use anyhow::Result;

use super::{manifest, resolve_options};
use crate::cli::ResolveArgs;
use plugdesc::ops::{build_plan, format_plan, resolve_package};
use plugdesc::util::GlobalContext;

pub fn execute(args: ResolveArgs, ctx: &GlobalContext) -> Result<()> {
    let manifest_path = manifest(ctx, args.path.as_deref())?;
    let resolve = resolve_package(&manifest_path, &resolve_options(ctx, &args.index))?;
    let plan = build_plan(&resolve, args.units)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", format_plan(&plan));
    }
    Ok(())
}
