//! `plugdesc check` command

use anyhow::Result;

use super::{manifest, resolve_options};
use crate::cli::CheckArgs;
use plugdesc::ops;
use plugdesc::util::diagnostic::{emit, Diagnostic};
use plugdesc::util::GlobalContext;

pub fn execute(args: CheckArgs, ctx: &GlobalContext) -> Result<()> {
    let manifest_path = manifest(ctx, args.path.as_deref())?;
    let report = ops::check(&manifest_path, &resolve_options(ctx, &args.index))?;

    if report.generated {
        let diag = Diagnostic::warning(format!("`{}` is a generated package", report.root))
            .with_location(&manifest_path)
            .with_suggestion("Change the plugins it was generated from and run `plugdesc generate` again");
        emit(&diag, ctx.color());
    }

    println!(
        "`{}` is valid ({} package(s) checked)",
        report.root,
        report.build_order.len()
    );
    if ctx.is_verbose() {
        for name in &report.build_order {
            println!("  {}", name);
        }
    }
    Ok(())
}
