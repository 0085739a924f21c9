//! Descriptor checking.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::Validator;
use crate::format;
use crate::ops::resolve::{resolve_package, ResolveOptions};

/// Outcome of a successful check.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub root: String,

    /// Every selected package, in build order
    pub build_order: Vec<String>,

    /// Whether the root descriptor is a generated file
    pub generated: bool,
}

/// Parse the descriptor, load and resolve its dependencies, and validate
/// every selected package against the descriptors of its dependencies.
pub fn check(manifest_path: &Path, opts: &ResolveOptions) -> Result<CheckReport> {
    let root = format::load(manifest_path)?;
    Validator::new(&root)
        .validate()
        .with_context(|| format!("invalid descriptor: {}", manifest_path.display()))?;

    let resolve = resolve_package(manifest_path, opts)?;
    let build_order = resolve.build_order()?;

    for name in &build_order {
        let Some(package) = resolve.package(name) else {
            continue;
        };
        let descriptor = &package.candidate.descriptor;

        let mut validator = Validator::new(descriptor);
        for dep in &descriptor.dependencies {
            if let Some(resolved) = resolve.package(&dep.name) {
                validator = validator.with_dependency(&dep.name, &resolved.candidate.descriptor);
            }
        }

        validator.validate().with_context(|| {
            format!(
                "invalid descriptor: {}",
                package.candidate.manifest_path.display()
            )
        })?;
        tracing::debug!("checked `{}`", name);
    }

    Ok(CheckReport {
        root: root.name,
        build_order,
        generated: root.generated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::classify;
    use crate::core::ErrorKind;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(file), content).unwrap();
    }

    const CORE: &str = r#"
[package]
name = "core"

[platforms]
ios = "12.0"

[products.CoreKit]
targets = ["CoreKit"]

[targets.CoreKit]
"#;

    #[test]
    fn test_check_valid_package() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("core"), "Plugin.toml", CORE);
        write(
            &tmp.path().join("app"),
            "Package.swift",
            r#"// swift-tools-version: 5.9
import PackageDescription

let package = Package(
    name: "app",
    platforms: [.iOS("12.0")],
    products: [.library(name: "app", targets: ["app"])],
    dependencies: [.package(name: "core", path: "../core")],
    targets: [
        .target(name: "app", dependencies: [.product(name: "CoreKit", package: "core")])
    ]
)
"#,
        );

        let report = check(
            &tmp.path().join("app").join("Package.swift"),
            &ResolveOptions::default(),
        )
        .unwrap();
        assert_eq!(report.root, "app");
        assert_eq!(report.build_order, vec!["core", "app"]);
        assert!(!report.generated);
    }

    #[test]
    fn test_check_missing_product_in_dependency() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("core"), "Plugin.toml", CORE);
        write(
            &tmp.path().join("app"),
            "Package.swift",
            r#"import PackageDescription

let package = Package(
    name: "app",
    platforms: [.iOS("12.0")],
    products: [.library(name: "app", targets: ["app"])],
    dependencies: [.package(name: "core", path: "../core")],
    targets: [
        .target(name: "app", dependencies: [.product(name: "CoreUI", package: "core")])
    ]
)
"#,
        );

        let err = check(
            &tmp.path().join("app").join("Package.swift"),
            &ResolveOptions::default(),
        )
        .unwrap_err();
        assert_eq!(classify(&err), Some(ErrorKind::UnresolvedReference));
    }

    #[test]
    fn test_check_malformed_root() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "Package.swift",
            "import PackageDescription\nlet package = Package(name: \"x\")\n",
        );

        let err = check(&tmp.path().join("Package.swift"), &ResolveOptions::default()).unwrap_err();
        assert_eq!(classify(&err), Some(ErrorKind::MalformedDescriptor));
    }
}
