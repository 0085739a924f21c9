//! Global context for plugdesc operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::core::workspace::{find_manifest_upward, locate_manifest, ManifestError};
use crate::util::config::{self, Config};

/// Project directories for plugdesc
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("dev", "plugdesc", "plugdesc"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Directory holding the global `config.toml`
    config_dir: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let config_dir = match PROJECT_DIRS.as_ref() {
            Some(dirs) => dirs.config_dir().to_path_buf(),
            None => PathBuf::from(config::PROJECT_CONFIG_DIR),
        };

        Ok(GlobalContext {
            cwd,
            config_dir,
            verbose: false,
            color: true,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Use a specific global configuration directory.
    pub fn with_config_dir(mut self, dir: PathBuf) -> Self {
        self.config_dir = dir;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Get the project configuration file path.
    pub fn project_config_path(&self) -> PathBuf {
        config::project_config_path(&self.cwd)
    }

    /// Load the merged global and project configuration.
    pub fn config(&self) -> Config {
        config::load_config(&self.config_path(), &self.project_config_path())
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Find the descriptor named by `path` (a file or package directory),
    /// or the nearest one above the working directory when no path is given.
    pub fn find_manifest(&self, path: Option<&Path>) -> Result<PathBuf, ManifestError> {
        match path {
            Some(p) => locate_manifest(&self.cwd.join(p)),
            None => find_manifest_upward(&self.cwd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
        assert!(ctx.config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_find_manifest_upward() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("Package.swift");
        std::fs::write(&manifest, "").unwrap();
        let nested = tmp.path().join("Sources").join("pkg");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested).unwrap();
        assert_eq!(ctx.find_manifest(None).ok(), Some(manifest));
    }

    #[test]
    fn test_find_manifest_ambiguous() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("Package.swift"), "").unwrap();
        std::fs::write(tmp.path().join("Plugin.toml"), "").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf()).unwrap();
        assert!(matches!(
            ctx.find_manifest(None),
            Err(ManifestError::AmbiguousManifest { .. })
        ));
    }

    #[test]
    fn test_project_config_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global");
        std::fs::create_dir_all(&global).unwrap();
        std::fs::write(
            global.join("config.toml"),
            "[generate]\npackage-name = \"FromGlobal\"\n",
        )
        .unwrap();

        let project = tmp.path().join("app");
        std::fs::create_dir_all(project.join(".plugdesc")).unwrap();
        std::fs::write(
            project.join(".plugdesc").join("config.toml"),
            "[generate]\npackage-name = \"FromProject\"\n",
        )
        .unwrap();

        let ctx = GlobalContext::with_cwd(project).unwrap().with_config_dir(global);
        assert_eq!(ctx.config().package_name(), "FromProject");
    }
}
