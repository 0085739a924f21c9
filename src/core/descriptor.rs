//! The package descriptor.
//!
//! A descriptor is the declarative description of a package: identity,
//! platform minimums, products, dependencies and targets. Descriptors are
//! immutable once parsed; tooling regenerates them instead of editing.

use semver::Version;
use serde::Serialize;

use crate::core::dependency::PackageDependency;
use crate::core::platform::{Platform, PlatformRequirement, PlatformVersion};
use crate::core::product::Product;
use crate::core::target::Target;

/// Marker written into descriptors produced by tooling.
pub const GENERATED_MARKER: &str = "Generated file. Do not edit.";

/// A parsed package descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    /// Package identity
    pub name: String,

    /// Package version, when the descriptor is published in an index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,

    /// Minimum tools version (`// swift-tools-version: 5.9`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_version: Option<String>,

    /// Whether the descriptor was produced by tooling
    pub generated: bool,

    pub platforms: Vec<PlatformRequirement>,
    pub products: Vec<Product>,
    pub dependencies: Vec<PackageDependency>,
    pub targets: Vec<Target>,
}

impl PackageDescriptor {
    /// Create an empty descriptor with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        PackageDescriptor {
            name: name.into(),
            version: None,
            tools_version: None,
            generated: false,
            platforms: Vec::new(),
            products: Vec::new(),
            dependencies: Vec::new(),
            targets: Vec::new(),
        }
    }

    pub fn with_platform(mut self, platform: Platform, min_version: PlatformVersion) -> Self {
        self.platforms.push(PlatformRequirement::new(platform, min_version));
        self
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    pub fn with_dependency(mut self, dependency: PackageDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    /// Get a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Get a product by name.
    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Get a declared dependency by name.
    pub fn dependency(&self, name: &str) -> Option<&PackageDependency> {
        self.dependencies.iter().find(|d| d.name == name)
    }

    /// The minimum version declared for a platform.
    pub fn min_version(&self, platform: Platform) -> Option<&PlatformVersion> {
        self.platforms
            .iter()
            .find(|p| p.platform == platform)
            .map(|p| &p.min_version)
    }

    /// The first library product (what a consumer depends on by default).
    pub fn primary_library(&self) -> Option<&Product> {
        self.products.iter().find(|p| p.kind.is_library())
    }

    /// The package version, or `0.0.0` for unversioned local packages.
    pub fn version_or_default(&self) -> Version {
        self.version.clone().unwrap_or_else(|| Version::new(0, 0, 0))
    }

    /// A copy with every order-insensitive list sorted, so two descriptors
    /// that differ only in declaration order compare equal.
    ///
    /// Target dependency order and header search path order are kept: both
    /// are significant to the build tool.
    pub fn canonical(&self) -> PackageDescriptor {
        let mut out = self.clone();
        out.platforms.sort_by_key(|p| p.platform);
        out.products.sort_by(|a, b| a.name.cmp(&b.name));
        out.dependencies.sort_by(|a, b| a.name.cmp(&b.name));
        out.targets.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Semantic equality: equal after [`canonical`](Self::canonical).
    pub fn is_equivalent(&self, other: &PackageDescriptor) -> bool {
        self.canonical() == other.canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::TargetDependency;

    #[test]
    fn test_equivalence_ignores_declaration_order() {
        let a = PackageDescriptor::new("pkg")
            .with_platform(Platform::IOS, PlatformVersion::new(12, 0))
            .with_platform(Platform::MacOS, PlatformVersion::new(10, 14))
            .with_target(Target::new("a"))
            .with_target(Target::new("b"));

        let b = PackageDescriptor::new("pkg")
            .with_platform(Platform::MacOS, PlatformVersion::new(10, 14))
            .with_platform(Platform::IOS, PlatformVersion::new(12, 0))
            .with_target(Target::new("b"))
            .with_target(Target::new("a"));

        assert_ne!(a, b);
        assert!(a.is_equivalent(&b));
    }

    #[test]
    fn test_equivalence_keeps_target_dependency_order() {
        let a = PackageDescriptor::new("pkg").with_target(
            Target::new("t")
                .with_dependency(TargetDependency::ByName { name: "x".into() })
                .with_dependency(TargetDependency::ByName { name: "y".into() }),
        );
        let b = PackageDescriptor::new("pkg").with_target(
            Target::new("t")
                .with_dependency(TargetDependency::ByName { name: "y".into() })
                .with_dependency(TargetDependency::ByName { name: "x".into() }),
        );

        assert!(!a.is_equivalent(&b));
    }

    #[test]
    fn test_lookups() {
        let desc = PackageDescriptor::new("flutter_pdfview")
            .with_platform(Platform::IOS, PlatformVersion::new(12, 0))
            .with_product(Product::library("flutter-pdfview", vec!["flutter_pdfview".into()]))
            .with_target(Target::new("flutter_pdfview"));

        assert!(desc.target("flutter_pdfview").is_some());
        assert_eq!(desc.primary_library().unwrap().name, "flutter-pdfview");
        assert_eq!(
            desc.min_version(Platform::IOS).unwrap().to_string(),
            "12.0"
        );
        assert!(desc.min_version(Platform::MacOS).is_none());
        assert_eq!(desc.version_or_default(), Version::new(0, 0, 0));
    }
}
