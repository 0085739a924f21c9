//! Core data structures.
//!
//! This module contains the descriptor model and the rules it must obey:
//! - Package descriptor, platforms, products, dependencies, targets
//! - Referential validation
//! - Descriptor discovery on disk
//! - The error taxonomy shared by every layer

pub mod dependency;
pub mod descriptor;
pub mod errors;
pub mod platform;
pub mod product;
pub mod target;
pub mod validate;
pub mod workspace;

pub use dependency::{DependencyLocation, PackageDependency, VersionRequirement};
pub use descriptor::{PackageDescriptor, GENERATED_MARKER};
pub use errors::ErrorKind;
pub use platform::{Platform, PlatformRequirement, PlatformVersion};
pub use product::{Linkage, Product, ProductKind};
pub use target::{CSettings, Define, Resource, ResourceRule, Target, TargetDependency, TargetKind};
pub use validate::{validate, ValidationError, ValidationErrors, Validator};
pub use workspace::{
    find_manifest, find_manifest_upward, locate_manifest, ManifestError, SWIFT_MANIFEST_NAME,
    TOML_MANIFEST_NAME,
};
