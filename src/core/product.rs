//! Products - the externally consumable units a package exposes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Linkage requested for a library product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Let the build tool decide (no `type:` argument in `Package.swift`)
    #[default]
    Automatic,
    Static,
    Dynamic,
}

impl Linkage {
    /// The `.static` / `.dynamic` member name, if any.
    pub fn swift_member(&self) -> Option<&'static str> {
        match self {
            Linkage::Automatic => None,
            Linkage::Static => Some("static"),
            Linkage::Dynamic => Some("dynamic"),
        }
    }
}

/// What kind of artifact a product is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "linkage")]
pub enum ProductKind {
    Library(Linkage),
    Executable,
}

impl ProductKind {
    pub fn is_library(&self) -> bool {
        matches!(self, ProductKind::Library(_))
    }
}

impl Default for ProductKind {
    fn default() -> Self {
        ProductKind::Library(Linkage::Automatic)
    }
}

/// A named product referencing one or more targets of the same package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub name: String,
    pub kind: ProductKind,
    pub targets: Vec<String>,
}

impl Product {
    /// Create an automatic-linkage library product.
    pub fn library(name: impl Into<String>, targets: Vec<String>) -> Self {
        Product {
            name: name.into(),
            kind: ProductKind::default(),
            targets,
        }
    }

    /// Set the product kind.
    pub fn with_kind(mut self, kind: ProductKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.targets.join(", "))
    }
}
