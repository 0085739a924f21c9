//! Descriptor re-serialization.

use std::path::Path;

use anyhow::Result;

use crate::format::{self, DescriptorFormat};

/// Parse a descriptor and render it in `target`.
pub fn show(manifest_path: &Path, target: DescriptorFormat) -> Result<String> {
    let descriptor = format::load(manifest_path)?;
    format::render(&descriptor, target)
}
