//! The declarative `Package.swift` subset.
//!
//! Only what package tooling writes is understood: imports, a single
//! `let package = Package(...)` binding, labelled arguments, string
//! literals, arrays, ranges and `.member(...)` calls. Anything that needs a
//! Swift interpreter (variables, conditionals, closures) is rejected.

mod decode;
pub mod lexer;
pub mod parser;
mod writer;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{PackageDescriptor, GENERATED_MARKER};
use crate::format::MalformedDescriptor;

pub use writer::render;

static TOOLS_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^//\s*swift-tools-version\s*:\s*([0-9]+(?:\.[0-9]+){0,2})")
        .expect("tools-version pattern is valid")
});

/// Parse `Package.swift` text. `path` is used for messages.
pub fn parse(content: &str, path: &Path) -> Result<PackageDescriptor, MalformedDescriptor> {
    let stmts = parser::parse_file(content).map_err(|e| {
        MalformedDescriptor::new(path, content, e.message).with_span(e.span)
    })?;

    let mut descriptor = decode::decode(&stmts).map_err(|e| {
        let err = MalformedDescriptor::new(path, content, e.message.clone()).with_span(e.span);
        if e.message.starts_with("no `let package") {
            err.with_help("a manifest declares its package as `let package = Package(name: ..., ...)`")
        } else {
            err
        }
    })?;

    descriptor.tools_version = tools_version(content);
    descriptor.generated = content.contains(GENERATED_MARKER);
    Ok(descriptor)
}

/// The `// swift-tools-version:` header, which must be the first line.
fn tools_version(content: &str) -> Option<String> {
    let first = content.lines().next()?;
    TOOLS_VERSION
        .captures(first)
        .map(|caps| caps[1].to_string())
}
