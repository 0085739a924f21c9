//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `config.toml` in the platform configuration directory
//! - Project: `.plugdesc/config.toml` - project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::PlatformRequirement;

/// Default name of the aggregate package.
pub const DEFAULT_PACKAGE_NAME: &str = "FlutterGeneratedPluginSwiftPackage";

/// Tools version written into generated descriptors.
pub const DEFAULT_TOOLS_VERSION: &str = "5.9";

/// Name of the project configuration directory.
pub const PROJECT_CONFIG_DIR: &str = ".plugdesc";

/// plugdesc configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolution settings
    pub resolve: ResolveConfig,

    /// Aggregate package generation settings
    pub generate: GenerateConfig,
}

/// Resolution-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolveConfig {
    /// Local index directories searched for versioned dependencies
    pub index_paths: Vec<PathBuf>,
}

/// Generation-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GenerateConfig {
    /// Name of the aggregate package
    pub package_name: Option<String>,

    /// `swift-tools-version` written into the header
    pub tools_version: Option<String>,

    /// Directory the aggregate package is written under
    pub output_dir: Option<PathBuf>,

    /// Write plugin paths relative to the generated package
    pub relative_paths: Option<bool>,

    /// Platform minimums overriding the computed ones (`ios = "13.0"`)
    pub platforms: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if !other.resolve.index_paths.is_empty() {
            self.resolve.index_paths = other.resolve.index_paths;
        }

        if other.generate.package_name.is_some() {
            self.generate.package_name = other.generate.package_name;
        }
        if other.generate.tools_version.is_some() {
            self.generate.tools_version = other.generate.tools_version;
        }
        if other.generate.output_dir.is_some() {
            self.generate.output_dir = other.generate.output_dir;
        }
        if other.generate.relative_paths.is_some() {
            self.generate.relative_paths = other.generate.relative_paths;
        }
        if !other.generate.platforms.is_empty() {
            self.generate.platforms = other.generate.platforms;
        }
    }

    /// Resolve relative paths against the directory holding the config file.
    fn anchor(mut self, base: &Path) -> Self {
        for path in &mut self.resolve.index_paths {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(dir) = &mut self.generate.output_dir {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        self
    }

    /// The aggregate package name, falling back to the default.
    pub fn package_name(&self) -> &str {
        self.generate
            .package_name
            .as_deref()
            .unwrap_or(DEFAULT_PACKAGE_NAME)
    }

    /// The tools version, falling back to the default.
    pub fn tools_version(&self) -> &str {
        self.generate
            .tools_version
            .as_deref()
            .unwrap_or(DEFAULT_TOOLS_VERSION)
    }

    /// Parse the configured platform overrides.
    pub fn platform_overrides(&self) -> Result<Vec<PlatformRequirement>> {
        self.generate
            .platforms
            .iter()
            .map(|s| {
                s.parse::<PlatformRequirement>()
                    .with_context(|| format!("invalid platform override `{}` in config", s))
            })
            .collect()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.plugdesc/config.toml)
/// 2. Global config
/// 3. Defaults
///
/// Relative paths in each file are taken relative to the directory that
/// contains the `.plugdesc` directory (project) or the config file (global).
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let base = global_path.parent().unwrap_or(Path::new("."));
        config.merge(Config::load_or_default(global_path).anchor(base));
    }

    if project_path.exists() {
        let base = project_path
            .parent()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."));
        config.merge(Config::load_or_default(project_path).anchor(base));
    }

    config
}

/// Get the project config path (.plugdesc/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_DIR).join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Platform;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.resolve.index_paths.is_empty());
        assert_eq!(config.package_name(), DEFAULT_PACKAGE_NAME);
        assert_eq!(config.tools_version(), "5.9");
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[resolve]
index-paths = ["/srv/plugin-index"]

[generate]
package-name = "AppPlugins"
platforms = ["ios=13.0"]
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(
            config.resolve.index_paths,
            vec![PathBuf::from("/srv/plugin-index")]
        );
        assert_eq!(config.package_name(), "AppPlugins");

        let overrides = config.platform_overrides().unwrap();
        assert_eq!(overrides[0].platform, Platform::IOS);
    }

    #[test]
    fn test_config_rejects_unknown_types() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[generate]\npackage-name = 5\n").unwrap();

        assert!(Config::load(&config_path).is_err());
        assert_eq!(
            Config::load_or_default(&config_path).package_name(),
            DEFAULT_PACKAGE_NAME
        );
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = project_config_path(&tmp.path().join("app"));
        std::fs::create_dir_all(project_path.parent().unwrap()).unwrap();

        std::fs::write(
            &global_path,
            "[generate]\npackage-name = \"Global\"\ntools-version = \"5.10\"\n",
        )
        .unwrap();
        std::fs::write(
            &project_path,
            "[generate]\npackage-name = \"Project\"\noutput-dir = \"ios/Packages\"\n",
        )
        .unwrap();

        let config = load_config(&global_path, &project_path);
        assert_eq!(config.package_name(), "Project");
        assert_eq!(config.tools_version(), "5.10");
        assert_eq!(
            config.generate.output_dir,
            Some(tmp.path().join("app").join("ios/Packages"))
        );
    }
}
