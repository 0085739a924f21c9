//! `plugdesc generate` command

use anyhow::Result;

use crate::cli::GenerateArgs;
use plugdesc::ops::{generate, GenerateOptions};
use plugdesc::util::GlobalContext;

pub fn execute(args: GenerateArgs, ctx: &GlobalContext) -> Result<()> {
    let config = ctx.config();

    let output_dir = match args.output {
        Some(dir) => ctx.cwd().join(dir),
        None => config
            .generate
            .output_dir
            .clone()
            .unwrap_or_else(|| ctx.cwd().to_path_buf()),
    };
    let plugins = args.plugins.iter().map(|p| ctx.cwd().join(p)).collect();

    let mut opts = GenerateOptions::from_config(&config, plugins, output_dir)?;
    if let Some(name) = args.name {
        opts.package_name = name;
    }
    if !args.platforms.is_empty() {
        opts.platforms = args.platforms;
    }
    if args.relative {
        opts.relative_paths = true;
    }

    let result = generate(&opts)?;
    if result.written {
        println!("wrote {}", result.manifest_path.display());
    } else {
        println!("{} is up to date", result.manifest_path.display());
    }
    Ok(())
}
