//! Version requirements as PubGrub ranges.

use pubgrub::Range;
use semver::Version;

use crate::core::VersionRequirement;

/// Convert a dependency's requirement to a PubGrub range.
///
/// Path dependencies have no requirement and accept any version. Branch
/// and revision pins cannot be checked against published versions, so they
/// accept any version as well.
pub fn requirement_to_range(req: Option<&VersionRequirement>) -> Range<Version> {
    let Some(req) = req else {
        return Range::full();
    };

    match req {
        VersionRequirement::UpToNextMajor(min) => {
            Range::between(min.clone(), Version::new(min.major + 1, 0, 0))
        }
        VersionRequirement::UpToNextMinor(min) => Range::between(
            min.clone(),
            Version::new(min.major, min.minor + 1, 0),
        ),
        VersionRequirement::Exact(v) => Range::singleton(v.clone()),
        VersionRequirement::Range { lower, upper } => Range::between(lower.clone(), upper.clone()),
        VersionRequirement::Branch(_) | VersionRequirement::Revision(_) => Range::full(),
    }
}

/// Parse a version string, allowing for incomplete versions.
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = s.split('.').collect();
    match parts.len() {
        1 => {
            let major: u64 = parts[0].parse().ok()?;
            Some(Version::new(major, 0, 0))
        }
        2 => {
            let major: u64 = parts[0].parse().ok()?;
            let minor: u64 = parts[1].parse().ok()?;
            Some(Version::new(major, minor, 0))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_to_next_major() {
        let req = VersionRequirement::UpToNextMajor(Version::new(1, 2, 3));
        let range = requirement_to_range(Some(&req));

        assert!(range.contains(&Version::new(1, 2, 3)));
        assert!(range.contains(&Version::new(1, 9, 0)));
        assert!(!range.contains(&Version::new(2, 0, 0)));
        assert!(!range.contains(&Version::new(1, 2, 2)));
    }

    #[test]
    fn test_up_to_next_minor() {
        let req = VersionRequirement::UpToNextMinor(Version::new(0, 3, 1));
        let range = requirement_to_range(Some(&req));

        assert!(range.contains(&Version::new(0, 3, 9)));
        assert!(!range.contains(&Version::new(0, 4, 0)));
    }

    #[test]
    fn test_exact_and_half_open() {
        let exact = requirement_to_range(Some(&VersionRequirement::Exact(Version::new(2, 1, 0))));
        assert!(exact.contains(&Version::new(2, 1, 0)));
        assert!(!exact.contains(&Version::new(2, 1, 1)));

        let ranged = requirement_to_range(Some(&VersionRequirement::Range {
            lower: Version::new(1, 0, 0),
            upper: Version::new(1, 5, 0),
        }));
        assert!(ranged.contains(&Version::new(1, 4, 9)));
        assert!(!ranged.contains(&Version::new(1, 5, 0)));
    }

    #[test]
    fn test_unversioned_requirements_accept_anything() {
        assert!(requirement_to_range(None).contains(&Version::new(0, 0, 0)));
        let branch = VersionRequirement::Branch("main".to_string());
        assert!(requirement_to_range(Some(&branch)).contains(&Version::new(7, 0, 0)));
    }

    #[test]
    fn test_parse_version_lenient() {
        assert_eq!(parse_version_lenient("1"), Some(Version::new(1, 0, 0)));
        assert_eq!(parse_version_lenient("1.2"), Some(Version::new(1, 2, 0)));
        assert_eq!(parse_version_lenient("1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_version_lenient("latest"), None);
    }
}
