//! Referential validation of descriptors.
//!
//! Parsing only checks shape. Validation checks that names are unique and
//! that every reference lands somewhere: products to local targets, target
//! dependencies to local targets or to products exposed by declared
//! dependencies. All problems are collected before reporting.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Component, Path};

use thiserror::Error;

use crate::core::errors::ErrorKind;
use crate::core::target::{Target, TargetDependency};
use crate::core::PackageDescriptor;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// What a dangling reference was supposed to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Target,
    Package,
    Product,
    TargetOrProduct,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferenceKind::Target => "target",
            ReferenceKind::Package => "package",
            ReferenceKind::Product => "product",
            ReferenceKind::TargetOrProduct => "target or product",
        };
        f.write_str(s)
    }
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("package name must not be empty")]
    EmptyName,

    #[error("duplicate {kind} `{name}` in package `{package}`")]
    DuplicateName {
        package: String,
        kind: &'static str,
        name: String,
    },

    #[error("product `{product}` in package `{package}` exposes no targets")]
    EmptyProduct { package: String, product: String },

    #[error("{origin} in package `{package}` references unknown {kind} `{name}`")]
    UnresolvedReference {
        package: String,
        origin: String,
        kind: ReferenceKind,
        name: String,
        available: Vec<String>,
    },

    #[error("header search path `{path}` of target `{target}` in package `{package}` {reason}")]
    InvalidPath {
        package: String,
        target: String,
        path: String,
        reason: &'static str,
    },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            _ => ErrorKind::MalformedDescriptor,
        }
    }
}

/// Every problem found in one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("package `{package}` failed validation with {} error(s)", errors.len())]
pub struct ValidationErrors {
    pub package: String,
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// The kind of the first error; unresolved references win over
    /// structural problems when both are present.
    pub fn kind(&self) -> ErrorKind {
        if self
            .errors
            .iter()
            .any(|e| e.kind() == ErrorKind::UnresolvedReference)
        {
            ErrorKind::UnresolvedReference
        } else {
            ErrorKind::MalformedDescriptor
        }
    }

    pub fn has_unresolved_reference(&self) -> bool {
        self.kind() == ErrorKind::UnresolvedReference
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(format!("invalid descriptor for `{}`", self.package));

        for err in &self.errors {
            diag = diag.with_context(err.to_string());
            if let ValidationError::UnresolvedReference { available, .. } = err {
                if !available.is_empty() {
                    diag = diag.with_context(format!("available: {}", available.join(", ")));
                }
            }
        }

        match self.kind() {
            ErrorKind::UnresolvedReference => diag.with_suggestion(suggestions::UNRESOLVED_REFERENCE),
            _ => diag.with_suggestion("Fix the descriptor; generated descriptors should be regenerated"),
        }
    }
}

/// Validates a descriptor, optionally against the descriptors of its
/// declared dependencies.
///
/// Dependencies whose descriptor is not supplied are only checked by name:
/// product references into them cannot be confirmed or refuted.
pub struct Validator<'a> {
    descriptor: &'a PackageDescriptor,
    dependencies: HashMap<&'a str, &'a PackageDescriptor>,
}

impl<'a> Validator<'a> {
    pub fn new(descriptor: &'a PackageDescriptor) -> Self {
        Validator {
            descriptor,
            dependencies: HashMap::new(),
        }
    }

    /// Supply the descriptor for the declared dependency `name`.
    pub fn with_dependency(mut self, name: &'a str, descriptor: &'a PackageDescriptor) -> Self {
        self.dependencies.insert(name, descriptor);
        self
    }

    /// Run every check.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.descriptor.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName);
        }

        self.check_unique(&mut errors);
        self.check_products(&mut errors);

        for target in &self.descriptor.targets {
            self.check_target_dependencies(target, &mut errors);
            self.check_header_paths(target, &mut errors);
        }

        if errors.is_empty() {
            tracing::debug!("package `{}` is valid", self.descriptor.name);
            Ok(())
        } else {
            Err(ValidationErrors {
                package: self.descriptor.name.clone(),
                errors,
            })
        }
    }

    fn check_unique(&self, errors: &mut Vec<ValidationError>) {
        let desc = self.descriptor;
        let package = &desc.name;

        let mut report = |kind: &'static str, names: Vec<String>| {
            let mut seen = HashSet::new();
            for name in names {
                if !seen.insert(name.clone()) {
                    errors.push(ValidationError::DuplicateName {
                        package: package.clone(),
                        kind,
                        name,
                    });
                }
            }
        };

        report(
            "platform",
            desc.platforms
                .iter()
                .map(|p| p.platform.to_string())
                .collect(),
        );
        report("product", desc.products.iter().map(|p| p.name.clone()).collect());
        report(
            "dependency",
            desc.dependencies.iter().map(|d| d.name.clone()).collect(),
        );
        report("target", desc.targets.iter().map(|t| t.name.clone()).collect());
    }

    fn check_products(&self, errors: &mut Vec<ValidationError>) {
        let desc = self.descriptor;

        for product in &desc.products {
            if product.targets.is_empty() {
                errors.push(ValidationError::EmptyProduct {
                    package: desc.name.clone(),
                    product: product.name.clone(),
                });
            }

            for target in &product.targets {
                if desc.target(target).is_none() {
                    errors.push(ValidationError::UnresolvedReference {
                        package: desc.name.clone(),
                        origin: format!("product `{}`", product.name),
                        kind: ReferenceKind::Target,
                        name: target.clone(),
                        available: desc.targets.iter().map(|t| t.name.clone()).collect(),
                    });
                }
            }
        }
    }

    fn check_target_dependencies(&self, target: &Target, errors: &mut Vec<ValidationError>) {
        let desc = self.descriptor;
        let origin = format!("target `{}`", target.name);

        for dep in &target.dependencies {
            match dep {
                TargetDependency::Target { name } => {
                    if desc.target(name).is_none() {
                        errors.push(ValidationError::UnresolvedReference {
                            package: desc.name.clone(),
                            origin: origin.clone(),
                            kind: ReferenceKind::Target,
                            name: name.clone(),
                            available: desc.targets.iter().map(|t| t.name.clone()).collect(),
                        });
                    }
                }
                TargetDependency::Product { name, package } => {
                    if desc.dependency(package).is_none() {
                        errors.push(ValidationError::UnresolvedReference {
                            package: desc.name.clone(),
                            origin: origin.clone(),
                            kind: ReferenceKind::Package,
                            name: package.clone(),
                            available: desc.dependencies.iter().map(|d| d.name.clone()).collect(),
                        });
                        continue;
                    }

                    match self.dependencies.get(package.as_str()) {
                        Some(dep_desc) if dep_desc.product(name).is_none() => {
                            errors.push(ValidationError::UnresolvedReference {
                                package: desc.name.clone(),
                                origin: origin.clone(),
                                kind: ReferenceKind::Product,
                                name: format!("{}/{}", package, name),
                                available: dep_desc
                                    .products
                                    .iter()
                                    .map(|p| p.name.clone())
                                    .collect(),
                            });
                        }
                        Some(_) => {}
                        None => tracing::debug!(
                            "descriptor for `{}` not loaded; cannot confirm product `{}`",
                            package,
                            name
                        ),
                    }
                }
                TargetDependency::ByName { name } => {
                    if !self.by_name_resolves(name) {
                        errors.push(ValidationError::UnresolvedReference {
                            package: desc.name.clone(),
                            origin: origin.clone(),
                            kind: ReferenceKind::TargetOrProduct,
                            name: name.clone(),
                            available: Vec::new(),
                        });
                    }
                }
            }
        }
    }

    /// A bare name matches a local target or a product in any declared
    /// dependency. An unloaded dependency might expose it, so it counts.
    fn by_name_resolves(&self, name: &str) -> bool {
        let desc = self.descriptor;
        if desc.target(name).is_some() {
            return true;
        }

        desc.dependencies
            .iter()
            .any(|dep| match self.dependencies.get(dep.name.as_str()) {
                Some(dep_desc) => dep_desc.product(name).is_some(),
                None => true,
            })
    }

    fn check_header_paths(&self, target: &Target, errors: &mut Vec<ValidationError>) {
        for path in &target.c_settings.header_search_paths {
            let reason = if Path::new(path).is_absolute() {
                Some("must be relative")
            } else if escapes_root(Path::new(path)) {
                Some("escapes the package root")
            } else {
                None
            };

            if let Some(reason) = reason {
                errors.push(ValidationError::InvalidPath {
                    package: self.descriptor.name.clone(),
                    target: target.name.clone(),
                    path: path.clone(),
                    reason,
                });
            }
        }
    }
}

/// Validate a descriptor on its own.
pub fn validate(descriptor: &PackageDescriptor) -> Result<(), ValidationErrors> {
    Validator::new(descriptor).validate()
}

fn escapes_root(path: &Path) -> bool {
    let mut depth: i64 = 0;
    for component in path.components() {
        match component {
            Component::ParentDir => depth -= 1,
            Component::Normal(_) => depth += 1,
            _ => {}
        }
        if depth < 0 {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{Platform, PlatformVersion};
    use crate::core::{PackageDependency, Product};

    fn pdfview() -> PackageDescriptor {
        PackageDescriptor::new("flutter_pdfview")
            .with_platform(Platform::IOS, PlatformVersion::new(12, 0))
            .with_product(Product::library(
                "flutter-pdfview",
                vec!["flutter_pdfview".to_string()],
            ))
            .with_target(
                Target::new("flutter_pdfview").with_header_search_path("include/flutter_pdfview"),
            )
    }

    #[test]
    fn test_plugin_descriptor_is_valid() {
        assert!(validate(&pdfview()).is_ok());
    }

    #[test]
    fn test_product_must_reference_declared_target() {
        let desc = pdfview().with_product(Product::library("extra", vec!["missing".into()]));

        let err = validate(&desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
        assert!(matches!(
            &err.errors[0],
            ValidationError::UnresolvedReference { kind: ReferenceKind::Target, name, .. } if name == "missing"
        ));
    }

    #[test]
    fn test_product_from_undeclared_package() {
        let desc = PackageDescriptor::new("app")
            .with_target(Target::new("app").with_dependency(TargetDependency::product("x", "nope")));

        let err = validate(&desc).unwrap_err();
        assert!(matches!(
            &err.errors[0],
            ValidationError::UnresolvedReference { kind: ReferenceKind::Package, .. }
        ));
    }

    #[test]
    fn test_missing_product_in_known_dependency() {
        let plugin = pdfview();
        let app = PackageDescriptor::new("app")
            .with_dependency(PackageDependency::path("flutter_pdfview", "../flutter_pdfview"))
            .with_target(
                Target::new("app")
                    .with_dependency(TargetDependency::product("pdfview", "flutter_pdfview")),
            );

        let err = Validator::new(&app)
            .with_dependency("flutter_pdfview", &plugin)
            .validate()
            .unwrap_err();

        assert!(err.has_unresolved_reference());
        match &err.errors[0] {
            ValidationError::UnresolvedReference { available, .. } => {
                assert_eq!(available, &vec!["flutter-pdfview".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("available: flutter-pdfview"));
        assert!(output.contains("Run `plugdesc show` on the dependency"));
    }

    #[test]
    fn test_product_in_unloaded_dependency_is_accepted() {
        let app = PackageDescriptor::new("app")
            .with_dependency(PackageDependency::path("flutter_pdfview", "../flutter_pdfview"))
            .with_target(
                Target::new("app")
                    .with_dependency(TargetDependency::product("anything", "flutter_pdfview")),
            );

        assert!(validate(&app).is_ok());
    }

    #[test]
    fn test_by_name_resolution() {
        let plugin = pdfview();
        let app = PackageDescriptor::new("app")
            .with_dependency(PackageDependency::path("flutter_pdfview", "../flutter_pdfview"))
            .with_target(Target::new("util"))
            .with_target(
                Target::new("app")
                    .with_dependency(TargetDependency::ByName { name: "util".into() })
                    .with_dependency(TargetDependency::ByName {
                        name: "flutter-pdfview".into(),
                    }),
            );

        assert!(Validator::new(&app)
            .with_dependency("flutter_pdfview", &plugin)
            .validate()
            .is_ok());

        let broken = app.with_target(
            Target::new("other").with_dependency(TargetDependency::ByName { name: "ghost".into() }),
        );
        let err = Validator::new(&broken)
            .with_dependency("flutter_pdfview", &plugin)
            .validate()
            .unwrap_err();
        assert_eq!(err.errors.len(), 1);
    }

    #[test]
    fn test_duplicates_and_paths_are_malformed() {
        let desc = pdfview()
            .with_dependency(PackageDependency::path("a", "../a"))
            .with_dependency(PackageDependency::path("a", "../b"))
            .with_target(Target::new("escape").with_header_search_path("../../outside"))
            .with_target(Target::new("abs").with_header_search_path("/usr/include"));

        let err = validate(&desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
        assert_eq!(err.errors.len(), 3);
        assert!(err.to_diagnostic().format(false).contains("duplicate dependency `a`"));
    }

    #[test]
    fn test_escapes_root() {
        assert!(!escapes_root(Path::new("include/../src")));
        assert!(escapes_root(Path::new("../include")));
        assert!(escapes_root(Path::new("include/../../x")));
    }
}
