//! plugdesc CLI - package descriptors for mobile plugin packages

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use miette::{GraphicalReportHandler, GraphicalTheme};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use plugdesc::core::{ManifestError, ValidationErrors};
use plugdesc::util::diagnostic::{emit, suggestions, Diagnostic};
use plugdesc::util::GlobalContext;
use plugdesc::{MalformedDescriptor, ResolveError};

fn main() {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over --verbose
    let default_filter = if cli.verbose {
        "plugdesc=debug"
    } else {
        "plugdesc=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(color);

    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &ctx),
        Commands::Resolve(args) => commands::resolve::execute(args, &ctx),
        Commands::Tree(args) => commands::tree::execute(args, &ctx),
        Commands::Show(args) => commands::show::execute(args, &ctx),
        Commands::Generate(args) => commands::generate::execute(args, &ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error: parse errors as a source excerpt, known errors as
/// diagnostics with suggestions, anything else as its context chain.
fn report(err: &anyhow::Error, color: bool) {
    let outer = err.to_string();

    for cause in err.chain() {
        if let Some(malformed) = cause.downcast_ref::<MalformedDescriptor>() {
            let handler = if color {
                GraphicalReportHandler::new()
            } else {
                GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
            };
            let mut out = String::new();
            if handler.render_report(&mut out, malformed).is_ok() {
                eprint!("{}", out);
                return;
            }
        }

        let diag = if let Some(e) = cause.downcast_ref::<ValidationErrors>() {
            Some(e.to_diagnostic())
        } else if let Some(e) = cause.downcast_ref::<ResolveError>() {
            Some(e.to_diagnostic())
        } else {
            cause.downcast_ref::<ManifestError>().map(|e| match e {
                ManifestError::NotFound { .. } => {
                    Diagnostic::error(e.to_string()).with_suggestion(suggestions::NO_MANIFEST)
                }
                ManifestError::AmbiguousManifest { .. } => Diagnostic::error(e.to_string()),
            })
        };

        if let Some(mut diag) = diag {
            if outer != cause.to_string() {
                diag = diag.with_context(outer);
            }
            emit(&diag, color);
            return;
        }
    }

    eprintln!("error: {:#}", err);
}
