//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::core::ErrorKind;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error during dependency resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// The cycle, first element repeated at the end
        cycle: Vec<String>,
    },

    #[error("version conflict for `{package}`")]
    VersionConflict {
        package: String,
        requirements: Vec<(String, String)>, // (requirer, requirement)
    },

    #[error("no set of versions satisfies every requirement:\n{report}")]
    NoSolution { report: String },

    #[error("could not find package `{package}` required by `{requirer}` ({location})")]
    PackageNotFound {
        package: String,
        requirer: String,
        location: String,
    },
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::CyclicDependency { .. } => ErrorKind::CyclicDependency,
            ResolveError::VersionConflict { .. } | ResolveError::NoSolution { .. } => {
                ErrorKind::VersionConflict
            }
            ResolveError::PackageNotFound { .. } => ErrorKind::PackageNotFound,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::CyclicDependency { cycle } => {
                Diagnostic::error("cyclic dependency")
                    .with_context(format!("cycle: {}", cycle.join(" -> ")))
                    .with_suggestion(suggestions::CYCLE)
            }

            ResolveError::VersionConflict {
                package,
                requirements,
            } => {
                let mut diag = Diagnostic::error(format!("version conflict for `{}`", package));

                for (requirer, req) in requirements {
                    diag = diag.with_context(format!("`{}` requires {} {}", requirer, package, req));
                }

                diag.with_suggestion(suggestions::VERSION_CONFLICT)
            }

            ResolveError::NoSolution { report } => {
                let mut diag = Diagnostic::error("version conflict");
                for line in report.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.trim());
                }
                diag.with_suggestion(suggestions::VERSION_CONFLICT)
            }

            ResolveError::PackageNotFound {
                package,
                requirer,
                location,
            } => Diagnostic::error(format!("could not find package `{}`", package))
                .with_context(format!("required by `{}` at {}", requirer, location))
                .with_suggestion(suggestions::PACKAGE_NOT_FOUND),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conflict_diagnostic() {
        let err = ResolveError::VersionConflict {
            package: "path_provider_foundation".to_string(),
            requirements: vec![
                ("app".to_string(), "at path /plugins/a".to_string()),
                ("flutter_pdfview".to_string(), "at path /plugins/b".to_string()),
            ],
        };

        assert_eq!(err.kind(), ErrorKind::VersionConflict);
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("version conflict for `path_provider_foundation`"));
        assert!(output.contains("`app` requires"));
        assert!(output.contains("/plugins/b"));
    }

    #[test]
    fn test_cycle_message() {
        let err = ResolveError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: a -> b -> a");
        assert_eq!(err.kind(), ErrorKind::CyclicDependency);
    }
}
