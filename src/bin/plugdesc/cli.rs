//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use plugdesc::core::PlatformRequirement;
use plugdesc::DescriptorFormat;

/// plugdesc - parse, validate and resolve plugin package descriptors
#[derive(Parser)]
#[command(name = "plugdesc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse, resolve and validate a package and its dependencies
    Check(CheckArgs),

    /// Print the build order
    Resolve(ResolveArgs),

    /// Display the dependency tree
    Tree(TreeArgs),

    /// Parse a descriptor and print it in another format
    Show(ShowArgs),

    /// Write the aggregate package for a set of plugins
    Generate(GenerateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct IndexArgs {
    /// Additional index directory for versioned dependencies
    #[arg(long = "index", value_name = "DIR")]
    pub index: Vec<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Package directory or descriptor (defaults to the nearest one)
    pub path: Option<PathBuf>,

    #[command(flatten)]
    pub index: IndexArgs,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Package directory or descriptor (defaults to the nearest one)
    pub path: Option<PathBuf>,

    /// Print the build plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Also list target-level build units
    #[arg(long)]
    pub units: bool,

    #[command(flatten)]
    pub index: IndexArgs,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Package directory or descriptor (defaults to the nearest one)
    pub path: Option<PathBuf>,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    #[command(flatten)]
    pub index: IndexArgs,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Package directory or descriptor (defaults to the nearest one)
    pub path: Option<PathBuf>,

    /// Output format: swift, toml or json
    #[arg(short, long, default_value = "swift")]
    pub format: DescriptorFormat,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Plugin package directory (repeatable, kept in order)
    #[arg(long = "plugin", value_name = "DIR", required = true)]
    pub plugins: Vec<PathBuf>,

    /// Directory to write `<name>/Package.swift` under
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Aggregate package name
    #[arg(long)]
    pub name: Option<String>,

    /// Platform minimum override, e.g. `ios=13.0` (repeatable)
    #[arg(long = "platform", value_name = "PLATFORM=VERSION")]
    pub platforms: Vec<PlatformRequirement>,

    /// Write plugin paths relative to the generated package
    #[arg(long)]
    pub relative: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
