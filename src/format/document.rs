//! `Plugin.toml` (and JSON) descriptor schema.
//!
//! ```toml
//! [package]
//! name = "flutter_pdfview"
//! tools-version = "5.9"
//!
//! [platforms]
//! ios = "12.0"
//!
//! [products.flutter-pdfview]
//! targets = ["flutter_pdfview"]
//!
//! [dependencies]
//! path_provider_foundation = { path = "../path_provider_foundation" }
//!
//! [targets.flutter_pdfview]
//! dependencies = [{ product = "path-provider-foundation", package = "path_provider_foundation" }]
//! header-search-paths = ["include/flutter_pdfview"]
//! ```
//!
//! Tables are keyed by name, so products, targets and dependencies come back
//! sorted by name; declaration order is not significant for them.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::core::dependency::is_valid_registry_id;
use crate::core::{
    CSettings, Define, DependencyLocation, Linkage, PackageDependency, PackageDescriptor,
    Platform, PlatformRequirement, PlatformVersion, Product, ProductKind, Resource, ResourceRule,
    Target, TargetDependency, TargetKind, VersionRequirement,
};
use crate::format::MalformedDescriptor;

/// Raw descriptor as deserialized from TOML or JSON.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    package: RawPackage,
    #[serde(deserialize_with = "unique_keys")]
    platforms: BTreeMap<String, String>,
    #[serde(deserialize_with = "unique_keys")]
    products: BTreeMap<String, RawProduct>,
    #[serde(
        default,
        deserialize_with = "unique_keys",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    dependencies: BTreeMap<String, RawDependency>,
    #[serde(deserialize_with = "unique_keys")]
    targets: BTreeMap<String, RawTarget>,
}

/// Deserialize a table keyed by name, rejecting a name that appears twice.
///
/// TOML already refuses duplicate keys; JSON objects would otherwise keep
/// the last entry.
fn unique_keys<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueKeys<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
        type Value = BTreeMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table keyed by name")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                if map.contains_key(&key) {
                    return Err(de::Error::custom(format!("duplicate name `{}`", key)));
                }
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueKeys(PhantomData))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawPackage {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tools_version: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    generated: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawProductType {
    #[default]
    Automatic,
    Static,
    Dynamic,
    Executable,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProduct {
    #[serde(default, rename = "type", skip_serializing_if = "is_automatic")]
    kind: RawProductType,
    targets: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawDependency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    up_to_next_minor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exact: Option<String>,
    /// `["1.0.0", "2.0.0"]` - lower bound inclusive, upper exclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawTargetDep {
    ByName(String),
    Product {
        product: String,
        package: String,
    },
    Target {
        target: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawResource {
    Process(String),
    Copy(String),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawTarget {
    #[serde(default, skip_serializing_if = "is_false")]
    test: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<RawTargetDep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_headers_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resources: Option<Vec<RawResource>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    header_search_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    defines: Vec<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_automatic(kind: &RawProductType) -> bool {
    *kind == RawProductType::Automatic
}

/// Parse `Plugin.toml` content.
pub fn parse_toml(content: &str, path: &Path) -> Result<PackageDescriptor, MalformedDescriptor> {
    let raw: RawDescriptor = toml::from_str(content).map_err(|e| {
        let err = MalformedDescriptor::new(path, content, e.message().to_string());
        match e.span() {
            Some(span) => err.with_span(span),
            None => err,
        }
    })?;

    Converter { path, content }.descriptor(raw)
}

/// Parse JSON descriptor content.
pub fn parse_json(content: &str, path: &Path) -> Result<PackageDescriptor, MalformedDescriptor> {
    let raw: RawDescriptor = serde_json::from_str(content).map_err(|e| {
        let offset = line_col_to_offset(content, e.line(), e.column());
        MalformedDescriptor::new(path, content, e.to_string()).with_span(offset..offset)
    })?;

    Converter { path, content }.descriptor(raw)
}

/// Render a descriptor as `Plugin.toml`.
pub fn render_toml(descriptor: &PackageDescriptor) -> Result<String> {
    toml::to_string_pretty(&to_raw(descriptor)).context("failed to serialize descriptor as TOML")
}

/// Render a descriptor as JSON.
pub fn render_json(descriptor: &PackageDescriptor) -> Result<String> {
    serde_json::to_string_pretty(&to_raw(descriptor))
        .context("failed to serialize descriptor as JSON")
}

fn line_col_to_offset(content: &str, line: usize, column: usize) -> usize {
    let line_start: usize = content
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(content.len())
}

/// Converts the raw schema into the model, reporting field-level errors.
struct Converter<'a> {
    path: &'a Path,
    content: &'a str,
}

impl Converter<'_> {
    fn error(&self, field: impl Into<String>, message: impl Into<String>) -> MalformedDescriptor {
        MalformedDescriptor::new(self.path, self.content, message).with_field(field)
    }

    fn descriptor(&self, raw: RawDescriptor) -> Result<PackageDescriptor, MalformedDescriptor> {
        let version = raw
            .package
            .version
            .as_deref()
            .map(|v| {
                Version::parse(v).map_err(|e| {
                    self.error("package.version", format!("invalid version `{}`: {}", v, e))
                })
            })
            .transpose()?;

        let mut platforms = Vec::new();
        for (key, version) in &raw.platforms {
            let platform: Platform = key.parse().map_err(|e| {
                self.error(format!("platforms.{}", key), format!("{}", e))
                    .with_help("known platforms: ios, macos, maccatalyst, tvos, watchos, visionos")
            })?;
            let min_version: PlatformVersion = version
                .parse()
                .map_err(|e| self.error(format!("platforms.{}", key), format!("{}", e)))?;
            platforms.push(PlatformRequirement::new(platform, min_version));
        }
        platforms.sort_by_key(|p| p.platform);

        let products = raw
            .products
            .into_iter()
            .map(|(name, p)| {
                let kind = match p.kind {
                    RawProductType::Automatic => ProductKind::Library(Linkage::Automatic),
                    RawProductType::Static => ProductKind::Library(Linkage::Static),
                    RawProductType::Dynamic => ProductKind::Library(Linkage::Dynamic),
                    RawProductType::Executable => ProductKind::Executable,
                };
                Product {
                    name,
                    kind,
                    targets: p.targets,
                }
            })
            .collect();

        let dependencies = raw
            .dependencies
            .into_iter()
            .map(|(name, dep)| self.dependency(name, dep))
            .collect::<Result<Vec<_>, _>>()?;

        let targets = raw
            .targets
            .into_iter()
            .map(|(name, t)| self.target(name, t))
            .collect();

        Ok(PackageDescriptor {
            name: raw.package.name,
            version,
            tools_version: raw.package.tools_version,
            generated: raw.package.generated,
            platforms,
            products,
            dependencies,
            targets,
        })
    }

    fn dependency(
        &self,
        name: String,
        raw: RawDependency,
    ) -> Result<PackageDependency, MalformedDescriptor> {
        let field = format!("dependencies.{}", name);

        let sources = [raw.path.is_some(), raw.url.is_some(), raw.id.is_some()]
            .iter()
            .filter(|set| **set)
            .count();
        if sources != 1 {
            return Err(self
                .error(&field, format!("dependency `{}` must specify exactly one of `path`, `url` or `id`", name)));
        }

        if let Some(path) = raw.path {
            let has_requirement = raw.from.is_some()
                || raw.up_to_next_minor.is_some()
                || raw.exact.is_some()
                || raw.range.is_some()
                || raw.branch.is_some()
                || raw.revision.is_some();
            if has_requirement {
                return Err(self.error(
                    &field,
                    format!("path dependency `{}` cannot carry a version requirement", name),
                ));
            }
            return Ok(PackageDependency::path(name, path));
        }

        let requirement = self.requirement(&field, &name, &raw)?;

        let location = if let Some(url) = raw.url {
            DependencyLocation::SourceControl { url, requirement }
        } else {
            let id = raw.id.unwrap_or_default();
            if !is_valid_registry_id(&id) {
                return Err(self.error(
                    &field,
                    format!("registry identity `{}` must have the form `scope.name`", id),
                ));
            }
            if !requirement.is_versioned() {
                return Err(self.error(
                    &field,
                    format!("registry dependency `{}` needs a version requirement", name),
                ));
            }
            DependencyLocation::Registry { id, requirement }
        };

        Ok(PackageDependency::new(name, location))
    }

    fn requirement(
        &self,
        field: &str,
        name: &str,
        raw: &RawDependency,
    ) -> Result<VersionRequirement, MalformedDescriptor> {
        let parse = |v: &str| {
            Version::parse(v)
                .map_err(|e| self.error(field, format!("invalid version `{}`: {}", v, e)))
        };

        let mut found = Vec::new();
        if let Some(v) = &raw.from {
            found.push(VersionRequirement::UpToNextMajor(parse(v)?));
        }
        if let Some(v) = &raw.up_to_next_minor {
            found.push(VersionRequirement::UpToNextMinor(parse(v)?));
        }
        if let Some(v) = &raw.exact {
            found.push(VersionRequirement::Exact(parse(v)?));
        }
        if let Some(bounds) = &raw.range {
            match bounds.as_slice() {
                [lower, upper] => found.push(VersionRequirement::Range {
                    lower: parse(lower)?,
                    upper: parse(upper)?,
                }),
                _ => {
                    return Err(self.error(
                        field,
                        "`range` must be a two-element array [lower, upper]",
                    ))
                }
            }
        }
        if let Some(branch) = &raw.branch {
            found.push(VersionRequirement::Branch(branch.clone()));
        }
        if let Some(revision) = &raw.revision {
            found.push(VersionRequirement::Revision(revision.clone()));
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(self.error(
                field,
                format!(
                    "dependency `{}` needs one of `from`, `up-to-next-minor`, `exact`, `range`, `branch` or `revision`",
                    name
                ),
            )),
            _ => Err(self.error(
                field,
                format!("dependency `{}` has more than one version requirement", name),
            )),
        }
    }

    fn target(&self, name: String, raw: RawTarget) -> Target {
        let dependencies = raw
            .dependencies
            .into_iter()
            .map(|d| match d {
                RawTargetDep::ByName(name) => TargetDependency::ByName { name },
                RawTargetDep::Product { product, package } => TargetDependency::Product {
                    name: product,
                    package,
                },
                RawTargetDep::Target { target } => TargetDependency::Target { name: target },
            })
            .collect();

        let resources = raw.resources.map(|list| {
            list.into_iter()
                .map(|r| match r {
                    RawResource::Process(path) => Resource {
                        rule: ResourceRule::Process,
                        path,
                    },
                    RawResource::Copy(path) => Resource {
                        rule: ResourceRule::Copy,
                        path,
                    },
                })
                .collect()
        });

        Target {
            name,
            kind: if raw.test {
                TargetKind::Test
            } else {
                TargetKind::Regular
            },
            dependencies,
            path: raw.path,
            public_headers_path: raw.public_headers_path,
            resources,
            c_settings: CSettings {
                header_search_paths: raw.header_search_paths,
                defines: raw.defines.iter().map(|d| Define::parse(d)).collect(),
            },
        }
    }
}

fn to_raw(desc: &PackageDescriptor) -> RawDescriptor {
    let platforms = desc
        .platforms
        .iter()
        .map(|p| (p.platform.key().to_string(), p.min_version.to_string()))
        .collect();

    let products = desc
        .products
        .iter()
        .map(|p| {
            let kind = match p.kind {
                ProductKind::Library(Linkage::Automatic) => RawProductType::Automatic,
                ProductKind::Library(Linkage::Static) => RawProductType::Static,
                ProductKind::Library(Linkage::Dynamic) => RawProductType::Dynamic,
                ProductKind::Executable => RawProductType::Executable,
            };
            (
                p.name.clone(),
                RawProduct {
                    kind,
                    targets: p.targets.clone(),
                },
            )
        })
        .collect();

    let dependencies = desc
        .dependencies
        .iter()
        .map(|d| (d.name.clone(), raw_dependency(&d.location)))
        .collect();

    let targets = desc
        .targets
        .iter()
        .map(|t| (t.name.clone(), raw_target(t)))
        .collect();

    RawDescriptor {
        package: RawPackage {
            name: desc.name.clone(),
            version: desc.version.as_ref().map(|v| v.to_string()),
            tools_version: desc.tools_version.clone(),
            generated: desc.generated,
        },
        platforms,
        products,
        dependencies,
        targets,
    }
}

fn raw_dependency(location: &DependencyLocation) -> RawDependency {
    let mut raw = RawDependency::default();

    let requirement = match location {
        DependencyLocation::Path { path } => {
            raw.path = Some(path.clone());
            return raw;
        }
        DependencyLocation::SourceControl { url, requirement } => {
            raw.url = Some(url.clone());
            requirement
        }
        DependencyLocation::Registry { id, requirement } => {
            raw.id = Some(id.clone());
            requirement
        }
    };

    match requirement {
        VersionRequirement::UpToNextMajor(v) => raw.from = Some(v.to_string()),
        VersionRequirement::UpToNextMinor(v) => raw.up_to_next_minor = Some(v.to_string()),
        VersionRequirement::Exact(v) => raw.exact = Some(v.to_string()),
        VersionRequirement::Range { lower, upper } => {
            raw.range = Some(vec![lower.to_string(), upper.to_string()])
        }
        VersionRequirement::Branch(b) => raw.branch = Some(b.clone()),
        VersionRequirement::Revision(r) => raw.revision = Some(r.clone()),
    }

    raw
}

fn raw_target(target: &Target) -> RawTarget {
    RawTarget {
        test: target.is_test(),
        dependencies: target
            .dependencies
            .iter()
            .map(|d| match d {
                TargetDependency::ByName { name } => RawTargetDep::ByName(name.clone()),
                TargetDependency::Product { name, package } => RawTargetDep::Product {
                    product: name.clone(),
                    package: package.clone(),
                },
                TargetDependency::Target { name } => RawTargetDep::Target {
                    target: name.clone(),
                },
            })
            .collect(),
        path: target.path.clone(),
        public_headers_path: target.public_headers_path.clone(),
        resources: target.resources.as_ref().map(|list| {
            list.iter()
                .map(|r| match r.rule {
                    ResourceRule::Process => RawResource::Process(r.path.clone()),
                    ResourceRule::Copy => RawResource::Copy(r.path.clone()),
                })
                .collect()
        }),
        header_search_paths: target.c_settings.header_search_paths.clone(),
        defines: target
            .c_settings
            .defines
            .iter()
            .map(|d| d.to_string())
            .collect(),
    }
}
