//! Descriptor discovery.
//!
//! A package directory holds exactly one descriptor: `Package.swift` or
//! `Plugin.toml`. Having both is ambiguous and rejected.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Canonical Swift descriptor file name.
pub const SWIFT_MANIFEST_NAME: &str = "Package.swift";

/// TOML descriptor file name.
pub const TOML_MANIFEST_NAME: &str = "Plugin.toml";

/// Errors locating a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("could not find Package.swift or Plugin.toml in {}", dir.display())]
    NotFound { dir: PathBuf },

    #[error(
        "found both {} and {}; keep only one descriptor per package",
        swift.display(),
        toml.display()
    )]
    AmbiguousManifest { swift: PathBuf, toml: PathBuf },
}

/// Find the descriptor in `dir` (no upward search).
pub fn find_manifest(dir: &Path) -> Result<PathBuf, ManifestError> {
    let swift = dir.join(SWIFT_MANIFEST_NAME);
    let toml = dir.join(TOML_MANIFEST_NAME);

    match (swift.is_file(), toml.is_file()) {
        (true, true) => Err(ManifestError::AmbiguousManifest { swift, toml }),
        (true, false) => Ok(swift),
        (false, true) => Ok(toml),
        (false, false) => Err(ManifestError::NotFound {
            dir: dir.to_path_buf(),
        }),
    }
}

/// Find the nearest descriptor starting at `start` and searching upward.
pub fn find_manifest_upward(start: &Path) -> Result<PathBuf, ManifestError> {
    let mut current = start.to_path_buf();
    loop {
        match find_manifest(&current) {
            Ok(path) => return Ok(path),
            Err(ManifestError::NotFound { .. }) => {
                if !current.pop() {
                    return Err(ManifestError::NotFound {
                        dir: start.to_path_buf(),
                    });
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Resolve a user-supplied path (file or package directory) to a
/// descriptor file.
pub fn locate_manifest(path: &Path) -> Result<PathBuf, ManifestError> {
    if path.is_dir() {
        find_manifest(path)
    } else if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(ManifestError::NotFound {
            dir: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            find_manifest(tmp.path()),
            Err(ManifestError::NotFound { .. })
        ));

        std::fs::write(tmp.path().join(SWIFT_MANIFEST_NAME), "").unwrap();
        assert_eq!(
            find_manifest(tmp.path()).unwrap(),
            tmp.path().join(SWIFT_MANIFEST_NAME)
        );
    }

    #[test]
    fn test_find_manifest_ambiguous() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(SWIFT_MANIFEST_NAME), "").unwrap();
        std::fs::write(tmp.path().join(TOML_MANIFEST_NAME), "").unwrap();

        let err = find_manifest(tmp.path()).unwrap_err();
        assert!(matches!(err, ManifestError::AmbiguousManifest { .. }));
        assert!(err.to_string().contains("keep only one"));
    }

    #[test]
    fn test_find_manifest_upward() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("Sources").join("flutter_pdfview");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(TOML_MANIFEST_NAME), "").unwrap();

        assert_eq!(
            find_manifest_upward(&nested).unwrap(),
            tmp.path().join(TOML_MANIFEST_NAME)
        );
    }

    #[test]
    fn test_locate_manifest_accepts_file_or_dir() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join(SWIFT_MANIFEST_NAME);
        std::fs::write(&file, "").unwrap();

        assert_eq!(locate_manifest(tmp.path()).unwrap(), file);
        assert_eq!(locate_manifest(&file).unwrap(), file);
        assert!(locate_manifest(&tmp.path().join("missing")).is_err());
    }
}
