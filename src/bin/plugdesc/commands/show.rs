//! `plugdesc show` command

use anyhow::Result;

use super::manifest;
use crate::cli::ShowArgs;
use plugdesc::ops;
use plugdesc::util::GlobalContext;

pub fn execute(args: ShowArgs, ctx: &GlobalContext) -> Result<()> {
    let manifest_path = manifest(ctx, args.path.as_deref())?;
    let text = ops::show(&manifest_path, args.format)?;

    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}
