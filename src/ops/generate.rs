//! Aggregate package generation.
//!
//! An application that uses several plugins builds them through one
//! generated package: a single static library whose only target depends on
//! the primary library product of every plugin.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::{
    workspace::locate_manifest, Linkage, PackageDependency, PackageDescriptor, Platform,
    PlatformRequirement, PlatformVersion, Product, ProductKind, Target, TargetDependency,
    Validator, SWIFT_MANIFEST_NAME,
};
use crate::format;
use crate::util::config::Config;
use crate::util::fs::{canonicalize_or_normalize, relative_path, write_if_changed};

/// Options for generating the aggregate package.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Plugin package directories (or descriptor files), in dependency order
    pub plugins: Vec<PathBuf>,

    /// Directory the `<name>/Package.swift` is written under
    pub output_dir: PathBuf,

    pub package_name: String,
    pub tools_version: String,

    /// Platform minimums that replace the computed ones
    pub platforms: Vec<PlatformRequirement>,

    /// Write plugin paths relative to the generated package directory
    pub relative_paths: bool,
}

impl GenerateOptions {
    /// Options with the configured name, tools version and platforms.
    pub fn from_config(config: &Config, plugins: Vec<PathBuf>, output_dir: PathBuf) -> Result<Self> {
        Ok(GenerateOptions {
            plugins,
            output_dir,
            package_name: config.package_name().to_string(),
            tools_version: config.tools_version().to_string(),
            platforms: config.platform_overrides()?,
            relative_paths: config.generate.relative_paths.unwrap_or(false),
        })
    }

    /// The package directory that will be generated.
    pub fn package_dir(&self) -> PathBuf {
        self.output_dir.join(&self.package_name)
    }
}

/// Result of a generation.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    /// The written (or up-to-date) descriptor file
    pub manifest_path: PathBuf,

    /// Whether the file changed
    pub written: bool,

    pub descriptor: PackageDescriptor,
}

/// A plugin loaded for aggregation.
#[derive(Debug, Clone)]
pub struct Plugin {
    /// The plugin's package directory
    pub dir: PathBuf,
    pub descriptor: PackageDescriptor,
}

/// Load the plugins named in the options.
pub fn load_plugins(paths: &[PathBuf]) -> Result<Vec<Plugin>> {
    paths
        .iter()
        .map(|path| {
            let manifest = locate_manifest(path)?;
            let descriptor = format::load(&manifest)?;
            Validator::new(&descriptor)
                .validate()
                .with_context(|| format!("invalid plugin descriptor: {}", manifest.display()))?;

            let dir = manifest.parent().unwrap_or(Path::new(".")).to_path_buf();
            Ok(Plugin {
                dir: canonicalize_or_normalize(&dir),
                descriptor,
            })
        })
        .collect()
}

/// Build the aggregate descriptor for a set of plugins.
pub fn aggregate_descriptor(plugins: &[Plugin], opts: &GenerateOptions) -> Result<PackageDescriptor> {
    let name = opts.package_name.as_str();
    let package_dir = canonicalize_or_normalize(&opts.output_dir).join(name);

    let mut target = Target::new(name);
    let mut desc = PackageDescriptor::new(name);
    desc.tools_version = Some(opts.tools_version.clone());
    desc.generated = true;
    desc.products.push(
        Product::library(name, vec![name.to_string()])
            .with_kind(ProductKind::Library(Linkage::Static)),
    );

    let mut minimums: BTreeMap<Platform, PlatformVersion> = BTreeMap::new();

    for plugin in plugins {
        let plugin_name = &plugin.descriptor.name;
        let Some(product) = plugin.descriptor.primary_library() else {
            bail!(
                "plugin `{}` at {} exposes no library product",
                plugin_name,
                plugin.dir.display()
            );
        };

        let path = if opts.relative_paths {
            relative_path(&package_dir, &plugin.dir)
        } else {
            plugin.dir.clone()
        };

        desc.dependencies
            .push(PackageDependency::path(plugin_name.clone(), path));
        target
            .dependencies
            .push(TargetDependency::product(product.name.clone(), plugin_name.clone()));

        for req in &plugin.descriptor.platforms {
            let entry = minimums
                .entry(req.platform)
                .or_insert_with(|| req.min_version.clone());
            if req.min_version > *entry {
                *entry = req.min_version.clone();
            }
        }
    }

    for req in &opts.platforms {
        minimums.insert(req.platform, req.min_version.clone());
    }

    desc.platforms = minimums
        .into_iter()
        .map(|(platform, min_version)| PlatformRequirement::new(platform, min_version))
        .collect();
    desc.targets.push(target);

    plugins
        .iter()
        .fold(Validator::new(&desc), |v, p| {
            v.with_dependency(&p.descriptor.name, &p.descriptor)
        })
        .validate()?;

    Ok(desc)
}

/// Generate `<output>/<name>/Package.swift` for the given plugins.
///
/// The file is only rewritten when its content changes. Nothing is written
/// when any plugin fails to load or the aggregate fails validation.
pub fn generate(opts: &GenerateOptions) -> Result<GenerateResult> {
    let plugins = load_plugins(&opts.plugins)?;
    let descriptor = aggregate_descriptor(&plugins, opts)?;

    let manifest_path = opts.package_dir().join(SWIFT_MANIFEST_NAME);
    let content = format::swift::render(&descriptor);
    let written = write_if_changed(&manifest_path, &content)?;

    if written {
        tracing::info!(
            "generated {} with {} plugin(s)",
            manifest_path.display(),
            plugins.len()
        );
    } else {
        tracing::info!("{} is up to date", manifest_path.display());
    }

    Ok(GenerateResult {
        manifest_path,
        written,
        descriptor,
    })
}
