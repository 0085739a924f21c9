//! Descriptor file formats.
//!
//! Descriptors are read from and written to three formats:
//! - `Package.swift`: the declarative subset of the Swift manifest language
//!   that package tooling generates
//! - `Plugin.toml`: the same model as TOML tables
//! - JSON, sharing the TOML schema (mainly for machine-readable output)
//!
//! Every parse failure is a [`MalformedDescriptor`] carrying the source text
//! and, where known, the span of the offending token.

pub mod document;
pub mod swift;

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::core::PackageDescriptor;

/// A descriptor file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Swift,
    Toml,
    Json,
}

impl DescriptorFormat {
    /// Pick the format from a file name or extension.
    pub fn from_path(path: &Path) -> Option<DescriptorFormat> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("swift") => Some(DescriptorFormat::Swift),
            Some("toml") => Some(DescriptorFormat::Toml),
            Some("json") => Some(DescriptorFormat::Json),
            _ => None,
        }
    }

    /// The conventional file name for this format.
    pub fn file_name(&self) -> &'static str {
        match self {
            DescriptorFormat::Swift => crate::core::SWIFT_MANIFEST_NAME,
            DescriptorFormat::Toml => crate::core::TOML_MANIFEST_NAME,
            DescriptorFormat::Json => "Plugin.json",
        }
    }
}

impl fmt::Display for DescriptorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DescriptorFormat::Swift => "swift",
            DescriptorFormat::Toml => "toml",
            DescriptorFormat::Json => "json",
        };
        f.write_str(s)
    }
}

impl FromStr for DescriptorFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "swift" => Ok(DescriptorFormat::Swift),
            "toml" => Ok(DescriptorFormat::Toml),
            "json" => Ok(DescriptorFormat::Json),
            _ => Err(format!(
                "invalid format '{}'; expected 'swift', 'toml', or 'json'",
                s
            )),
        }
    }
}

/// A descriptor that could not be parsed: bad syntax, a missing required
/// field, or a value of the wrong type.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("malformed descriptor {}{}: {message}", path.display(), field_suffix(field))]
#[diagnostic(code(plugdesc::parse::malformed_descriptor))]
pub struct MalformedDescriptor {
    pub path: PathBuf,
    pub message: String,
    /// Dotted path of the offending field, when known
    pub field: Option<String>,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
    #[help]
    pub help: Option<String>,
}

impl MalformedDescriptor {
    pub fn new(path: &Path, source: &str, message: impl Into<String>) -> Self {
        MalformedDescriptor {
            path: path.to_path_buf(),
            message: message.into(),
            field: None,
            src: NamedSource::new(path.display().to_string(), source.to_string()),
            span: None,
            help: None,
        }
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(SourceSpan::from(span));
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Byte offset of the labelled span, if any.
    pub fn offset(&self) -> Option<usize> {
        self.span.map(|s| s.offset())
    }
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(" (at `{}`)", f))
        .unwrap_or_default()
}

/// Parse descriptor text in the given format. `path` is used for messages.
pub fn parse(
    content: &str,
    format: DescriptorFormat,
    path: &Path,
) -> Result<PackageDescriptor, MalformedDescriptor> {
    match format {
        DescriptorFormat::Swift => swift::parse(content, path),
        DescriptorFormat::Toml => document::parse_toml(content, path),
        DescriptorFormat::Json => document::parse_json(content, path),
    }
}

/// Render a descriptor in the given format.
pub fn render(descriptor: &PackageDescriptor, format: DescriptorFormat) -> Result<String> {
    match format {
        DescriptorFormat::Swift => Ok(swift::render(descriptor)),
        DescriptorFormat::Toml => document::render_toml(descriptor),
        DescriptorFormat::Json => document::render_json(descriptor),
    }
}

/// Read and parse a descriptor file, choosing the format from its name.
pub fn load(path: &Path) -> Result<PackageDescriptor> {
    let format = DescriptorFormat::from_path(path).with_context(|| {
        format!(
            "cannot tell descriptor format of {}; expected a .swift, .toml or .json file",
            path.display()
        )
    })?;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read descriptor: {}", path.display()))?;

    let descriptor = parse(&content, format, path)?;
    tracing::debug!(
        "loaded `{}` from {} ({} targets)",
        descriptor.name,
        path.display(),
        descriptor.targets.len()
    );
    Ok(descriptor)
}
