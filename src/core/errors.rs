//! Error classification shared by every layer.

use std::fmt;

/// The category a descriptor error falls into.
///
/// Parse, validation and resolution errors each have their own type; this
/// is the coarse taxonomy reported to users and used for exit decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Syntax errors, missing required fields, wrong value types, and
    /// structural rule violations (duplicate names, invalid paths).
    MalformedDescriptor,
    /// A product, target or package reference that cannot be matched.
    UnresolvedReference,
    /// The package or target graph contains a cycle.
    CyclicDependency,
    /// Two resolutions for the same package disagree.
    VersionConflict,
    /// A dependency's descriptor could not be found.
    PackageNotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedDescriptor => "malformed descriptor",
            ErrorKind::UnresolvedReference => "unresolved reference",
            ErrorKind::CyclicDependency => "cyclic dependency",
            ErrorKind::VersionConflict => "version conflict",
            ErrorKind::PackageNotFound => "package not found",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an error chain by the first typed descriptor error it contains.
pub fn classify(err: &anyhow::Error) -> Option<ErrorKind> {
    use crate::core::validate::ValidationErrors;
    use crate::core::workspace::ManifestError;
    use crate::format::MalformedDescriptor;
    use crate::resolver::ResolveError;

    for cause in err.chain() {
        if cause.downcast_ref::<MalformedDescriptor>().is_some() {
            return Some(ErrorKind::MalformedDescriptor);
        }
        if let Some(e) = cause.downcast_ref::<ValidationErrors>() {
            return Some(e.kind());
        }
        if let Some(e) = cause.downcast_ref::<ResolveError>() {
            return Some(e.kind());
        }
        if let Some(e) = cause.downcast_ref::<ManifestError>() {
            return Some(match e {
                ManifestError::NotFound { .. } => ErrorKind::PackageNotFound,
                ManifestError::AmbiguousManifest { .. } => ErrorKind::MalformedDescriptor,
            });
        }
    }
    None
}
