//! User-friendly diagnostic messages.
//!
//! Every error shown to the user names the offending package or field, the
//! constraints involved, and what to do about it.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no descriptor is found.
    pub const NO_MANIFEST: &str =
        "Run the command inside a package directory or pass the path to its Package.swift";

    /// Suggestion when a dependency cannot be found.
    pub const PACKAGE_NOT_FOUND: &str =
        "Check the dependency's `path:`, or add an index directory under `[resolve] index-paths`";

    /// Suggestion when a reference cannot be resolved.
    pub const UNRESOLVED_REFERENCE: &str =
        "Run `plugdesc show` on the dependency to list the products it exposes";

    /// Suggestion when the dependency graph has a cycle.
    pub const CYCLE: &str = "Remove one of the dependencies in the cycle";

    /// Suggestion when versions cannot be reconciled.
    pub const VERSION_CONFLICT: &str =
        "Align the requirements, or point every package at the same location";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (self.severity, color) {
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
            (Severity::Error, false) => "error",
            (Severity::Warning, false) => "warning",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("unresolved reference in `app`")
            .with_location("ios/app/Package.swift")
            .with_context("target `app` depends on product `pdf-kit` of `flutter_pdfview`")
            .with_context("`flutter_pdfview` exposes: flutter-pdfview")
            .with_suggestion(suggestions::UNRESOLVED_REFERENCE);

        let output = diag.format(false);
        assert!(output.starts_with("error: unresolved reference"));
        assert!(output.contains("--> ios/app/Package.swift"));
        assert!(output.contains("exposes: flutter-pdfview"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Run `plugdesc show`"));
    }

    #[test]
    fn test_warning_color() {
        let output = Diagnostic::warning("ignoring `swiftSettings`").format(true);
        assert!(output.contains("\x1b[1;33mwarning"));
    }
}
