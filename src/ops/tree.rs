//! Dependency tree rendering.

use std::collections::HashSet;

use crate::resolver::Resolve;

/// Render the dependency tree below the root package.
///
/// Packages already printed are marked `(*)` and not expanded again.
pub fn format_tree(resolve: &Resolve, max_depth: Option<usize>) -> String {
    let mut out = String::new();
    let mut seen = HashSet::new();
    write_tree(
        resolve,
        resolve.root(),
        0,
        max_depth.unwrap_or(usize::MAX),
        &mut seen,
        &mut out,
    );
    out
}

fn write_tree<'a>(
    resolve: &'a Resolve,
    name: &'a str,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<&'a str>,
    out: &mut String,
) {
    if depth > max_depth {
        return;
    }

    let is_duplicate = !seen.insert(name);

    let prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}├── ", "│   ".repeat(depth - 1))
    };

    let version = resolve
        .package(name)
        .map(|p| format!(" v{}", p.version))
        .unwrap_or_default();
    let dup_marker = if is_duplicate { " (*)" } else { "" };

    out.push_str(&format!("{}{}{}{}\n", prefix, name, version, dup_marker));

    // Don't recurse into duplicates
    if is_duplicate {
        return;
    }

    for dep in resolve.deps(name) {
        write_tree(resolve, dep, depth + 1, max_depth, seen, out);
    }
}
