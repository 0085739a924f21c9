//! Render a descriptor as `Package.swift`.
//!
//! The layout matches what the application tooling generates: four-space
//! indentation, one array element per line, no trailing commas, and
//! products written on a single line.

use crate::core::{
    DependencyLocation, PackageDependency, PackageDescriptor, PlatformRequirement, Product,
    ProductKind, Target, TargetDependency, VersionRequirement, GENERATED_MARKER,
};

const INDENT: &str = "    ";

const TOOLS_VERSION_NOTE: &str =
    "// The swift-tools-version declares the minimum version of Swift required to build this package.";

pub fn render(descriptor: &PackageDescriptor) -> String {
    let mut out = String::new();

    if let Some(tools_version) = &descriptor.tools_version {
        out.push_str(&format!("// swift-tools-version: {}\n", tools_version));
        out.push_str(TOOLS_VERSION_NOTE);
        out.push('\n');
    }
    if descriptor.generated {
        out.push_str(&format!("//\n//  {}\n//\n", GENERATED_MARKER));
    }
    if !out.is_empty() {
        out.push('\n');
    }

    out.push_str("import PackageDescription\n\n");

    let args = vec![
        format!("name: {}", quote(&descriptor.name)),
        format!(
            "platforms: {}",
            array(descriptor.platforms.iter().map(platform).collect())
        ),
        format!(
            "products: {}",
            array(descriptor.products.iter().map(product).collect())
        ),
        format!(
            "dependencies: {}",
            array(descriptor.dependencies.iter().map(dependency).collect())
        ),
        format!(
            "targets: {}",
            array(descriptor.targets.iter().map(target).collect())
        ),
    ];

    out.push_str("let package = Package");
    out.push_str(&call_block(&args));
    out.push('\n');
    out
}

fn platform(req: &PlatformRequirement) -> String {
    format!(
        ".{}({})",
        req.platform.swift_name(),
        quote(&req.min_version.to_string())
    )
}

fn product(product: &Product) -> String {
    let targets = product
        .targets
        .iter()
        .map(|t| quote(t))
        .collect::<Vec<_>>()
        .join(", ");

    match product.kind {
        ProductKind::Library(linkage) => match linkage.swift_member() {
            Some(member) => format!(
                ".library(name: {}, type: .{}, targets: [{}])",
                quote(&product.name),
                member,
                targets
            ),
            None => format!(
                ".library(name: {}, targets: [{}])",
                quote(&product.name),
                targets
            ),
        },
        ProductKind::Executable => format!(
            ".executable(name: {}, targets: [{}])",
            quote(&product.name),
            targets
        ),
    }
}

fn dependency(dep: &PackageDependency) -> String {
    let mut args = Vec::new();

    match &dep.location {
        DependencyLocation::Path { path } => {
            args.push(format!("name: {}", quote(&dep.name)));
            args.push(format!("path: {}", quote(&path.to_string_lossy())));
        }
        DependencyLocation::SourceControl { url, requirement } => {
            if dep.location.default_name().as_deref() != Some(dep.name.as_str()) {
                args.push(format!("name: {}", quote(&dep.name)));
            }
            args.push(format!("url: {}", quote(url)));
            args.push(requirement_arg(requirement));
        }
        DependencyLocation::Registry { id, requirement } => {
            if dep.location.default_name().as_deref() != Some(dep.name.as_str()) {
                args.push(format!("name: {}", quote(&dep.name)));
            }
            args.push(format!("id: {}", quote(id)));
            args.push(requirement_arg(requirement));
        }
    }

    format!(".package({})", args.join(", "))
}

fn requirement_arg(req: &VersionRequirement) -> String {
    match req {
        VersionRequirement::UpToNextMajor(v) => format!("from: {}", quote(&v.to_string())),
        VersionRequirement::UpToNextMinor(v) => {
            format!(".upToNextMinor(from: {})", quote(&v.to_string()))
        }
        VersionRequirement::Exact(v) => format!("exact: {}", quote(&v.to_string())),
        VersionRequirement::Range { lower, upper } => format!(
            "{}..<{}",
            quote(&lower.to_string()),
            quote(&upper.to_string())
        ),
        VersionRequirement::Branch(b) => format!("branch: {}", quote(b)),
        VersionRequirement::Revision(r) => format!("revision: {}", quote(r)),
    }
}

fn target(target: &Target) -> String {
    let mut args = vec![
        format!("name: {}", quote(&target.name)),
        format!(
            "dependencies: {}",
            array(target.dependencies.iter().map(target_dependency).collect())
        ),
    ];

    if let Some(path) = &target.path {
        args.push(format!("path: {}", quote(path)));
    }
    if let Some(headers) = &target.public_headers_path {
        args.push(format!("publicHeadersPath: {}", quote(headers)));
    }
    if let Some(resources) = &target.resources {
        let items = resources
            .iter()
            .map(|r| format!(".{}({})", r.rule.swift_member(), quote(&r.path)))
            .collect();
        args.push(format!("resources: {}", array(items)));
    }
    if !target.c_settings.is_empty() {
        let mut items: Vec<String> = target
            .c_settings
            .header_search_paths
            .iter()
            .map(|p| format!(".headerSearchPath({})", quote(p)))
            .collect();
        items.extend(target.c_settings.defines.iter().map(|d| match &d.value {
            Some(value) => format!(".define({}, to: {})", quote(&d.name), quote(value)),
            None => format!(".define({})", quote(&d.name)),
        }));
        args.push(format!("cSettings: {}", array(items)));
    }

    let callee = if target.is_test() {
        ".testTarget"
    } else {
        ".target"
    };
    format!("{}{}", callee, call_block(&args))
}

fn target_dependency(dep: &TargetDependency) -> String {
    match dep {
        TargetDependency::Product { name, package } => format!(
            ".product(name: {}, package: {})",
            quote(name),
            quote(package)
        ),
        TargetDependency::Target { name } => format!(".target(name: {})", quote(name)),
        TargetDependency::ByName { name } => quote(name),
    }
}

/// `[]`, or one element per line.
fn array(items: Vec<String>) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    let body = items
        .iter()
        .map(|item| indent(item))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("[\n{}\n]", body)
}

/// `(` + one argument per line + `)`.
fn call_block(args: &[String]) -> String {
    let body = args
        .iter()
        .map(|arg| indent(arg))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("(\n{}\n)", body)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", INDENT, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Platform, PlatformVersion};

    #[test]
    fn test_empty_arrays_are_inline() {
        let desc = PackageDescriptor::new("empty");
        let text = render(&desc);
        assert!(text.starts_with("import PackageDescription\n\n"));
        assert!(text.contains("    platforms: [],\n"));
        assert!(text.contains("    targets: []\n)"));
    }

    #[test]
    fn test_target_layout() {
        let desc = PackageDescriptor::new("pkg")
            .with_platform(Platform::IOS, PlatformVersion::new(12, 0))
            .with_target(
                Target::new("pkg")
                    .with_dependency(TargetDependency::ByName {
                        name: "Core".to_string(),
                    })
                    .with_header_search_path("include/pkg"),
            );

        let text = render(&desc);
        let expected = r#"    targets: [
        .target(
            name: "pkg",
            dependencies: [
                "Core"
            ],
            cSettings: [
                .headerSearchPath("include/pkg")
            ]
        )
    ]"#;
        assert!(text.contains(expected), "{text}");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }
}
