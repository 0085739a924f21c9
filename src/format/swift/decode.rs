//! Turn the parsed `Package(...)` expression into a descriptor.

use std::ops::Range;

use semver::Version;

use crate::core::dependency::is_valid_registry_id;
use crate::core::{
    CSettings, Define, DependencyLocation, Linkage, PackageDependency, PackageDescriptor,
    Platform, PlatformRequirement, PlatformVersion, Product, ProductKind, Resource, ResourceRule,
    Target, TargetDependency, TargetKind, VersionRequirement,
};
use crate::format::swift::parser::{Arg, Expr, Stmt, SyntaxError};

type DecodeResult<T> = Result<T, SyntaxError>;

/// Arguments that SwiftPM accepts but this model does not carry. They are
/// dropped with a warning.
const IGNORED_PACKAGE_ARGS: &[&str] = &[
    "defaultLocalization",
    "pkgConfig",
    "providers",
    "swiftLanguageVersions",
    "swiftLanguageModes",
    "cLanguageStandard",
    "cxxLanguageStandard",
];

const IGNORED_TARGET_ARGS: &[&str] = &[
    "exclude",
    "sources",
    "cxxSettings",
    "swiftSettings",
    "linkerSettings",
    "plugins",
    "packageAccess",
];

/// Decode the statements of a manifest file.
pub fn decode(stmts: &[Stmt]) -> DecodeResult<PackageDescriptor> {
    let mut package = None;

    for stmt in stmts {
        match stmt {
            Stmt::Import { module, .. } => {
                if module != "PackageDescription" {
                    tracing::debug!("ignoring import of `{}`", module);
                }
            }
            Stmt::Binding { value, span, .. } => match value {
                Expr::Ident { name, args: Some(args), span: call_span } if name == "Package" => {
                    if package.is_some() {
                        return Err(SyntaxError::new(
                            "more than one `Package(...)` declaration",
                            span.clone(),
                        ));
                    }
                    package = Some(Call {
                        callee: "Package",
                        args,
                        span: call_span.clone(),
                    });
                }
                _ => {
                    return Err(SyntaxError::new(
                        "only `let package = Package(...)` bindings are supported",
                        span.clone(),
                    ))
                }
            },
        }
    }

    let call = package.ok_or_else(|| {
        SyntaxError::new("no `let package = Package(...)` declaration found", 0..0)
    })?;

    decode_package(&call)
}

fn decode_package(call: &Call<'_>) -> DecodeResult<PackageDescriptor> {
    call.check_labels(
        &["name", "platforms", "products", "dependencies", "targets"],
        IGNORED_PACKAGE_ARGS,
    )?;

    let name = expect_str(call.require("name")?, "package name")?;

    let platforms = expect_array(call.require("platforms")?, "platforms")?
        .iter()
        .map(decode_platform)
        .collect::<DecodeResult<Vec<_>>>()?;

    let products = expect_array(call.require("products")?, "products")?
        .iter()
        .map(decode_product)
        .collect::<DecodeResult<Vec<_>>>()?;

    let dependencies = match call.labelled("dependencies") {
        Some(expr) => expect_array(expr, "dependencies")?
            .iter()
            .map(decode_dependency)
            .collect::<DecodeResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    let targets = expect_array(call.require("targets")?, "targets")?
        .iter()
        .map(decode_target)
        .collect::<DecodeResult<Vec<_>>>()?;

    Ok(PackageDescriptor {
        name,
        version: None,
        tools_version: None,
        generated: false,
        platforms,
        products,
        dependencies,
        targets,
    })
}

fn decode_platform(expr: &Expr) -> DecodeResult<PlatformRequirement> {
    let call = Call::member(expr, "platform")?;
    let platform = Platform::from_swift_name(call.callee).ok_or_else(|| {
        SyntaxError::new(format!("unknown platform `.{}`", call.callee), call.span.clone())
    })?;

    let version_expr = call.single_unlabelled()?;
    let min_version = match version_expr {
        Expr::Str { value, span } => value.parse::<PlatformVersion>().map_err(|e| {
            SyntaxError::new(e.to_string(), span.clone())
        })?,
        Expr::Member {
            name,
            args: None,
            span,
        } => PlatformVersion::from_swift_member(name).ok_or_else(|| {
            SyntaxError::new(format!("invalid platform version `.{}`", name), span.clone())
        })?,
        other => {
            return Err(SyntaxError::new(
                format!("expected a version string, found {}", other.describe()),
                other.span(),
            ))
        }
    };

    Ok(PlatformRequirement::new(platform, min_version))
}

fn decode_product(expr: &Expr) -> DecodeResult<Product> {
    let call = Call::member(expr, "product")?;

    let kind = match call.callee {
        "library" => {
            call.check_labels(&["name", "type", "targets"], &[])?;
            let linkage = match call.labelled("type") {
                None => Linkage::Automatic,
                Some(Expr::Member { name, args: None, .. }) if name == "static" => Linkage::Static,
                Some(Expr::Member { name, args: None, .. }) if name == "dynamic" => {
                    Linkage::Dynamic
                }
                Some(other) => {
                    return Err(SyntaxError::new(
                        "library type must be `.static` or `.dynamic`",
                        other.span(),
                    ))
                }
            };
            ProductKind::Library(linkage)
        }
        "executable" => {
            call.check_labels(&["name", "targets"], &[])?;
            ProductKind::Executable
        }
        other => {
            return Err(SyntaxError::new(
                format!("unsupported product `.{}`; expected `.library` or `.executable`", other),
                call.span.clone(),
            ))
        }
    };

    let name = expect_str(call.require("name")?, "product name")?;
    let targets = expect_str_array(call.require("targets")?, "product targets")?;

    Ok(Product {
        name,
        kind,
        targets,
    })
}

fn decode_dependency(expr: &Expr) -> DecodeResult<PackageDependency> {
    let call = Call::member(expr, "package dependency")?;
    if call.callee != "package" {
        return Err(SyntaxError::new(
            format!("expected `.package(...)`, found `.{}`", call.callee),
            call.span.clone(),
        ));
    }
    call.check_labels(
        &["name", "path", "url", "id", "from", "exact", "branch", "revision"],
        &[],
    )?;

    let explicit_name = call
        .labelled("name")
        .map(|e| expect_str(e, "dependency name"))
        .transpose()?;

    let location = if let Some(path) = call.labelled("path") {
        if call.labelled("url").is_some() || call.labelled("id").is_some() {
            return Err(SyntaxError::new(
                "a dependency takes only one of `path:`, `url:` or `id:`",
                call.span.clone(),
            ));
        }
        let has_requirement = ["from", "exact", "branch", "revision"]
            .iter()
            .any(|label| call.labelled(label).is_some())
            || call.unlabelled().next().is_some();
        if has_requirement {
            return Err(SyntaxError::new(
                "a path dependency cannot carry a version requirement",
                call.span.clone(),
            ));
        }
        DependencyLocation::Path {
            path: expect_str(path, "dependency path")?.into(),
        }
    } else if let Some(url) = call.labelled("url") {
        if call.labelled("id").is_some() {
            return Err(SyntaxError::new(
                "a dependency takes only one of `url:` or `id:`",
                call.span.clone(),
            ));
        }
        DependencyLocation::SourceControl {
            url: expect_str(url, "dependency url")?,
            requirement: decode_requirement(&call)?,
        }
    } else if let Some(id_expr) = call.labelled("id") {
        let id = expect_str(id_expr, "registry identity")?;
        if !is_valid_registry_id(&id) {
            return Err(SyntaxError::new(
                format!("registry identity `{}` must have the form `scope.name`", id),
                id_expr.span(),
            ));
        }
        let requirement = decode_requirement(&call)?;
        if !requirement.is_versioned() {
            return Err(SyntaxError::new(
                "registry dependencies need a version requirement",
                call.span.clone(),
            ));
        }
        DependencyLocation::Registry { id, requirement }
    } else {
        return Err(SyntaxError::new(
            "`.package` needs one of `path:`, `url:` or `id:`",
            call.span.clone(),
        ));
    };

    let name = match explicit_name {
        Some(name) => name,
        None => location.default_name().ok_or_else(|| {
            SyntaxError::new(
                "cannot derive a package name from this location; add `name:`",
                call.span.clone(),
            )
        })?,
    };

    Ok(PackageDependency::new(name, location))
}

fn decode_requirement(call: &Call<'_>) -> DecodeResult<VersionRequirement> {
    let mut found = Vec::new();

    if let Some(e) = call.labelled("from") {
        found.push(VersionRequirement::UpToNextMajor(expect_version(e)?));
    }
    if let Some(e) = call.labelled("exact") {
        found.push(VersionRequirement::Exact(expect_version(e)?));
    }
    if let Some(e) = call.labelled("branch") {
        found.push(VersionRequirement::Branch(expect_str(e, "branch")?));
    }
    if let Some(e) = call.labelled("revision") {
        found.push(VersionRequirement::Revision(expect_str(e, "revision")?));
    }
    for expr in call.unlabelled() {
        found.push(decode_requirement_expr(expr)?);
    }

    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(SyntaxError::new(
            "dependency needs a version requirement (`from:`, `exact:`, a range, `branch:` or `revision:`)",
            call.span.clone(),
        )),
        _ => Err(SyntaxError::new(
            "dependency has more than one version requirement",
            call.span.clone(),
        )),
    }
}

fn decode_requirement_expr(expr: &Expr) -> DecodeResult<VersionRequirement> {
    match expr {
        Expr::Range {
            lower,
            upper,
            closed,
            ..
        } => {
            let lower = expect_version(lower)?;
            let mut upper = expect_version(upper)?;
            if *closed {
                let patch = upper.patch.checked_add(1).ok_or_else(|| {
                    SyntaxError::new("closed range upper bound is out of range", expr.span())
                })?;
                upper = Version::new(upper.major, upper.minor, patch);
            }
            Ok(VersionRequirement::Range { lower, upper })
        }
        Expr::Member { .. } => {
            let call = Call::member(expr, "version requirement")?;
            match call.callee {
                "upToNextMajor" => Ok(VersionRequirement::UpToNextMajor(expect_version(
                    call.require("from")?,
                )?)),
                "upToNextMinor" => Ok(VersionRequirement::UpToNextMinor(expect_version(
                    call.require("from")?,
                )?)),
                "exact" => Ok(VersionRequirement::Exact(expect_version(
                    call.single_unlabelled()?,
                )?)),
                "branch" => Ok(VersionRequirement::Branch(expect_str(
                    call.single_unlabelled()?,
                    "branch",
                )?)),
                "revision" => Ok(VersionRequirement::Revision(expect_str(
                    call.single_unlabelled()?,
                    "revision",
                )?)),
                other => Err(SyntaxError::new(
                    format!("unsupported version requirement `.{}`", other),
                    call.span.clone(),
                )),
            }
        }
        other => Err(SyntaxError::new(
            format!("expected a version requirement, found {}", other.describe()),
            other.span(),
        )),
    }
}

fn decode_target(expr: &Expr) -> DecodeResult<Target> {
    let call = Call::member(expr, "target")?;
    let kind = match call.callee {
        "target" => TargetKind::Regular,
        "testTarget" => TargetKind::Test,
        other => {
            return Err(SyntaxError::new(
                format!("unsupported target `.{}`; expected `.target` or `.testTarget`", other),
                call.span.clone(),
            ))
        }
    };
    call.check_labels(
        &[
            "name",
            "dependencies",
            "path",
            "publicHeadersPath",
            "resources",
            "cSettings",
        ],
        IGNORED_TARGET_ARGS,
    )?;

    let mut target = Target::new(expect_str(call.require("name")?, "target name")?);
    target.kind = kind;

    if let Some(deps) = call.labelled("dependencies") {
        target.dependencies = expect_array(deps, "target dependencies")?
            .iter()
            .map(decode_target_dependency)
            .collect::<DecodeResult<Vec<_>>>()?;
    }

    target.path = call
        .labelled("path")
        .map(|e| expect_str(e, "target path"))
        .transpose()?;
    target.public_headers_path = call
        .labelled("publicHeadersPath")
        .map(|e| expect_str(e, "public headers path"))
        .transpose()?;

    if let Some(resources) = call.labelled("resources") {
        target.resources = Some(
            expect_array(resources, "resources")?
                .iter()
                .map(decode_resource)
                .collect::<DecodeResult<Vec<_>>>()?,
        );
    }

    if let Some(settings) = call.labelled("cSettings") {
        target.c_settings = decode_c_settings(expect_array(settings, "cSettings")?)?;
    }

    Ok(target)
}

fn decode_target_dependency(expr: &Expr) -> DecodeResult<TargetDependency> {
    if let Expr::Str { value, .. } = expr {
        return Ok(TargetDependency::ByName {
            name: value.clone(),
        });
    }

    let call = Call::member(expr, "target dependency")?;
    match call.callee {
        "product" => {
            call.check_labels(&["name", "package"], &["condition", "moduleAliases"])?;
            Ok(TargetDependency::Product {
                name: expect_str(call.require("name")?, "product name")?,
                package: expect_str(call.require("package")?, "package name")?,
            })
        }
        "target" => {
            call.check_labels(&["name"], &["condition"])?;
            Ok(TargetDependency::Target {
                name: expect_str(call.require("name")?, "target name")?,
            })
        }
        "byName" => {
            call.check_labels(&["name"], &["condition"])?;
            Ok(TargetDependency::ByName {
                name: expect_str(call.require("name")?, "dependency name")?,
            })
        }
        other => Err(SyntaxError::new(
            format!("unsupported target dependency `.{}`", other),
            call.span.clone(),
        )),
    }
}

fn decode_resource(expr: &Expr) -> DecodeResult<Resource> {
    let call = Call::member(expr, "resource")?;
    let rule = match call.callee {
        "process" => ResourceRule::Process,
        "copy" => ResourceRule::Copy,
        other => {
            return Err(SyntaxError::new(
                format!("unsupported resource rule `.{}`", other),
                call.span.clone(),
            ))
        }
    };
    call.check_labels(&[], &["localization"])?;

    Ok(Resource {
        rule,
        path: expect_str(call.single_unlabelled()?, "resource path")?,
    })
}

fn decode_c_settings(items: &[Expr]) -> DecodeResult<CSettings> {
    let mut settings = CSettings::default();

    for item in items {
        let call = Call::member(item, "C setting")?;
        match call.callee {
            "headerSearchPath" => {
                call.check_labels(&[], &["condition"])?;
                settings
                    .header_search_paths
                    .push(expect_str(call.single_unlabelled()?, "header search path")?);
            }
            "define" => {
                call.check_labels(&["to"], &["condition"])?;
                let name = expect_str(call.single_unlabelled()?, "define name")?;
                let value = call
                    .labelled("to")
                    .map(|e| expect_str(e, "define value"))
                    .transpose()?;
                settings.defines.push(Define { name, value });
            }
            "unsafeFlags" => {
                tracing::warn!("ignoring `.unsafeFlags` C setting");
            }
            other => {
                return Err(SyntaxError::new(
                    format!("unsupported C setting `.{}`", other),
                    call.span.clone(),
                ))
            }
        }
    }

    Ok(settings)
}

/// A call expression viewed as callee plus arguments.
struct Call<'a> {
    callee: &'a str,
    args: &'a [Arg],
    span: Range<usize>,
}

impl<'a> Call<'a> {
    /// View a `.member(...)` expression as a call. A member without
    /// parentheses has no arguments.
    fn member(expr: &'a Expr, what: &str) -> DecodeResult<Call<'a>> {
        match expr {
            Expr::Member { name, args, span } => Ok(Call {
                callee: name,
                args: args.as_deref().unwrap_or(&[]),
                span: span.clone(),
            }),
            other => Err(SyntaxError::new(
                format!("expected a {} like `.name(...)`, found {}", what, other.describe()),
                other.span(),
            )),
        }
    }

    fn labelled(&self, label: &str) -> Option<&'a Expr> {
        self.args
            .iter()
            .find(|a| a.label.as_deref() == Some(label))
            .map(|a| &a.value)
    }

    fn require(&self, label: &str) -> DecodeResult<&'a Expr> {
        self.labelled(label).ok_or_else(|| {
            SyntaxError::new(
                format!("`{}` is missing required argument `{}`", self.callee, label),
                self.span.clone(),
            )
        })
    }

    fn unlabelled(&self) -> impl Iterator<Item = &'a Expr> + 'a {
        self.args
            .iter()
            .filter(|a| a.label.is_none())
            .map(|a| &a.value)
    }

    fn single_unlabelled(&self) -> DecodeResult<&'a Expr> {
        let mut iter = self.unlabelled();
        match (iter.next(), iter.next()) {
            (Some(expr), None) => Ok(expr),
            _ => Err(SyntaxError::new(
                format!("`.{}` takes exactly one unlabelled argument", self.callee),
                self.span.clone(),
            )),
        }
    }

    /// Reject unknown labels; warn about labels that are accepted but not
    /// modelled.
    fn check_labels(&self, known: &[&str], ignored: &[&str]) -> DecodeResult<()> {
        let mut seen: Vec<&str> = Vec::new();
        for arg in self.args {
            let Some(label) = arg.label.as_deref() else {
                continue;
            };
            if seen.contains(&label) {
                return Err(SyntaxError::new(
                    format!("duplicate argument `{}`", label),
                    arg.span.clone(),
                ));
            }
            seen.push(label);

            if ignored.contains(&label) {
                tracing::warn!("`{}`: ignoring unsupported argument `{}`", self.callee, label);
            } else if !known.contains(&label) {
                return Err(SyntaxError::new(
                    format!("unexpected argument `{}` in `{}`", label, self.callee),
                    arg.span.clone(),
                ));
            }
        }
        Ok(())
    }
}

fn expect_str(expr: &Expr, what: &str) -> DecodeResult<String> {
    match expr {
        Expr::Str { value, .. } => Ok(value.clone()),
        other => Err(SyntaxError::new(
            format!("expected a string for {}, found {}", what, other.describe()),
            other.span(),
        )),
    }
}

fn expect_array<'a>(expr: &'a Expr, what: &str) -> DecodeResult<&'a [Expr]> {
    match expr {
        Expr::Array { items, .. } => Ok(items),
        other => Err(SyntaxError::new(
            format!("expected an array for {}, found {}", what, other.describe()),
            other.span(),
        )),
    }
}

fn expect_str_array(expr: &Expr, what: &str) -> DecodeResult<Vec<String>> {
    expect_array(expr, what)?
        .iter()
        .map(|e| expect_str(e, what))
        .collect()
}

fn expect_version(expr: &Expr) -> DecodeResult<Version> {
    let text = expect_str(expr, "version")?;
    Version::parse(&text)
        .map_err(|e| SyntaxError::new(format!("invalid version `{}`: {}", text, e), expr.span()))
}
