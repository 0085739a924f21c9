//! plugdesc - package descriptors for mobile plugin packages
//!
//! This crate provides the core library functionality for plugdesc:
//! parsing `Package.swift` and `Plugin.toml` descriptors, validating their
//! references, resolving dependency graphs into a build order, and
//! generating the aggregate package that links an application's plugins.

pub mod core;
pub mod format;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

pub use crate::core::{
    errors::ErrorKind, PackageDependency, PackageDescriptor, Platform, Product, Target,
    TargetDependency,
};
pub use crate::format::{DescriptorFormat, MalformedDescriptor};

pub use resolver::{Resolve, ResolveError};
pub use util::context::GlobalContext;
