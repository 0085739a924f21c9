//! High-level operations.
//!
//! This module contains the implementation of plugdesc commands.

pub mod check;
pub mod generate;
pub mod resolve;
pub mod show;
pub mod tree;

pub use check::{check, CheckReport};
pub use generate::{aggregate_descriptor, generate, load_plugins, GenerateOptions, GenerateResult, Plugin};
pub use resolve::{build_plan, format_plan, resolve_package, BuildPlan, PlannedPackage, ResolveOptions};
pub use show::show;
pub use tree::format_tree;
