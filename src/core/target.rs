//! Build targets.
//!
//! A target is a compilation unit: a name, the products and targets it
//! depends on, optional resources, and C compiler settings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Regular library/source target or test target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Regular,
    Test,
}

/// A reference from a target to something it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum TargetDependency {
    /// `.product(name:package:)` - a product of a declared dependency
    Product { name: String, package: String },
    /// `.target(name:)` - a target of the same package
    Target { name: String },
    /// A bare name: a local target, or a product of the same name in any
    /// declared dependency.
    ByName { name: String },
}

impl TargetDependency {
    pub fn product(name: impl Into<String>, package: impl Into<String>) -> Self {
        TargetDependency::Product {
            name: name.into(),
            package: package.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TargetDependency::Product { name, .. }
            | TargetDependency::Target { name }
            | TargetDependency::ByName { name } => name,
        }
    }
}

impl fmt::Display for TargetDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDependency::Product { name, package } => write!(f, "{}/{}", package, name),
            TargetDependency::Target { name } => write!(f, "target {}", name),
            TargetDependency::ByName { name } => f.write_str(name),
        }
    }
}

/// How a resource file is bundled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceRule {
    /// Processed by the build tool (asset catalogs, storyboards, ...)
    Process,
    /// Copied verbatim
    Copy,
}

impl ResourceRule {
    pub fn swift_member(&self) -> &'static str {
        match self {
            ResourceRule::Process => "process",
            ResourceRule::Copy => "copy",
        }
    }
}

/// A resource bundled with a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub rule: ResourceRule,
    pub path: String,
}

/// A preprocessor define: `NAME` or `NAME=value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Define {
    pub name: String,
    pub value: Option<String>,
}

impl Define {
    /// Parse `NAME` or `NAME=value`.
    pub fn parse(s: &str) -> Define {
        match s.split_once('=') {
            Some((name, value)) => Define {
                name: name.to_string(),
                value: Some(value.to_string()),
            },
            None => Define {
                name: s.to_string(),
                value: None,
            },
        }
    }
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.name, value),
            None => f.write_str(&self.name),
        }
    }
}

/// C compiler settings (`cSettings`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CSettings {
    /// Header search paths, relative to the target directory
    pub header_search_paths: Vec<String>,
    pub defines: Vec<Define>,
}

impl CSettings {
    pub fn is_empty(&self) -> bool {
        self.header_search_paths.is_empty() && self.defines.is_empty()
    }
}

/// A compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    pub dependencies: Vec<TargetDependency>,
    /// Custom source directory
    pub path: Option<String>,
    pub public_headers_path: Option<String>,
    /// `None` when the descriptor omits the resource list, `Some(vec![])`
    /// when it declares an empty one.
    pub resources: Option<Vec<Resource>>,
    pub c_settings: CSettings,
}

impl Target {
    /// Create a regular target with no dependencies or settings.
    pub fn new(name: impl Into<String>) -> Self {
        Target {
            name: name.into(),
            kind: TargetKind::Regular,
            dependencies: Vec::new(),
            path: None,
            public_headers_path: None,
            resources: None,
            c_settings: CSettings::default(),
        }
    }

    /// Add a dependency reference.
    pub fn with_dependency(mut self, dep: TargetDependency) -> Self {
        self.dependencies.push(dep);
        self
    }

    /// Add a header search path.
    pub fn with_header_search_path(mut self, path: impl Into<String>) -> Self {
        self.c_settings.header_search_paths.push(path.into());
        self
    }

    pub fn is_test(&self) -> bool {
        self.kind == TargetKind::Test
    }

    /// Resources, treating an omitted list as empty.
    pub fn resources(&self) -> &[Resource] {
        self.resources.as_deref().unwrap_or(&[])
    }
}
