//! Platform minimum-version constraints.
//!
//! A descriptor declares at most one minimum version per platform. Versions
//! are dotted numeric strings (`12.0`, `10.14`, `17`) and compare as if
//! missing components were zero, so `12` and `12.0` are the same minimum.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A platform a package can declare a minimum deployment version for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "ios")]
    IOS,
    #[serde(rename = "macos")]
    MacOS,
    #[serde(rename = "maccatalyst")]
    MacCatalyst,
    #[serde(rename = "tvos")]
    TvOS,
    #[serde(rename = "watchos")]
    WatchOS,
    #[serde(rename = "visionos")]
    VisionOS,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::IOS,
        Platform::MacOS,
        Platform::MacCatalyst,
        Platform::TvOS,
        Platform::WatchOS,
        Platform::VisionOS,
    ];

    /// The member name used in `Package.swift` (`.iOS(...)`).
    pub fn swift_name(&self) -> &'static str {
        match self {
            Platform::IOS => "iOS",
            Platform::MacOS => "macOS",
            Platform::MacCatalyst => "macCatalyst",
            Platform::TvOS => "tvOS",
            Platform::WatchOS => "watchOS",
            Platform::VisionOS => "visionOS",
        }
    }

    /// The key used in `Plugin.toml` and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Platform::IOS => "ios",
            Platform::MacOS => "macos",
            Platform::MacCatalyst => "maccatalyst",
            Platform::TvOS => "tvos",
            Platform::WatchOS => "watchos",
            Platform::VisionOS => "visionos",
        }
    }

    /// Look up a platform by its `Package.swift` member name.
    pub fn from_swift_name(name: &str) -> Option<Platform> {
        Platform::ALL.into_iter().find(|p| p.swift_name() == name)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.swift_name())
    }
}

impl FromStr for Platform {
    type Err = PlatformVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.key() == lower)
            .ok_or_else(|| PlatformVersionError::UnknownPlatform(s.to_string()))
    }
}

/// Error parsing a platform or platform version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformVersionError {
    #[error("invalid platform version `{0}`; expected 1 to 3 dot-separated numbers")]
    InvalidVersion(String),

    #[error("unknown platform `{0}`")]
    UnknownPlatform(String),
}

/// A dotted minimum version such as `12.0`.
#[derive(Debug, Clone)]
pub struct PlatformVersion {
    components: Vec<u64>,
}

impl PlatformVersion {
    /// Create a `major.minor` version.
    pub fn new(major: u64, minor: u64) -> Self {
        PlatformVersion {
            components: vec![major, minor],
        }
    }

    /// Parse the `.vMAJOR_MINOR` member form used by `Package.swift`
    /// (`.v12` is `12.0`, `.v10_14` is `10.14`).
    pub fn from_swift_member(member: &str) -> Option<Self> {
        let digits = member.strip_prefix('v')?;
        let mut components = digits
            .split('_')
            .map(|c| c.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        if components.is_empty() || components.len() > 3 {
            return None;
        }
        if components.len() == 1 {
            components.push(0);
        }
        Some(PlatformVersion { components })
    }

    pub fn major(&self) -> u64 {
        self.components[0]
    }

    fn padded(&self) -> [u64; 3] {
        let mut out = [0; 3];
        for (slot, value) in out.iter_mut().zip(&self.components) {
            *slot = *value;
        }
        out
    }
}

impl FromStr for PlatformVersion {
    type Err = PlatformVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s
            .split('.')
            .map(|c| c.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PlatformVersionError::InvalidVersion(s.to_string()))?;

        if components.is_empty() || components.len() > 3 {
            return Err(PlatformVersionError::InvalidVersion(s.to_string()));
        }

        Ok(PlatformVersion { components })
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

impl PartialEq for PlatformVersion {
    fn eq(&self, other: &Self) -> bool {
        self.padded() == other.padded()
    }
}

impl Eq for PlatformVersion {}

impl PartialOrd for PlatformVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PlatformVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.padded().cmp(&other.padded())
    }
}

impl Serialize for PlatformVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlatformVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A `(platform, minimum version)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformRequirement {
    pub platform: Platform,
    pub min_version: PlatformVersion,
}

impl PlatformRequirement {
    pub fn new(platform: Platform, min_version: PlatformVersion) -> Self {
        PlatformRequirement {
            platform,
            min_version,
        }
    }
}

impl fmt::Display for PlatformRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.platform, self.min_version)
    }
}

impl FromStr for PlatformRequirement {
    type Err = PlatformVersionError;

    /// Parse `ios=13.0` as given on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (platform, version) = s
            .split_once('=')
            .ok_or_else(|| PlatformVersionError::InvalidVersion(s.to_string()))?;
        Ok(PlatformRequirement {
            platform: platform.trim().parse()?,
            min_version: version.trim().parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse_and_display() {
        let v: PlatformVersion = "12.0".parse().unwrap();
        assert_eq!(v.to_string(), "12.0");
        assert_eq!(v.major(), 12);

        assert!("12.x".parse::<PlatformVersion>().is_err());
        assert!("1.2.3.4".parse::<PlatformVersion>().is_err());
        assert!("".parse::<PlatformVersion>().is_err());
    }

    #[test]
    fn test_version_ordering_pads_missing_components() {
        let a: PlatformVersion = "12".parse().unwrap();
        let b: PlatformVersion = "12.0.0".parse().unwrap();
        let c: PlatformVersion = "10.14".parse().unwrap();

        assert_eq!(a, b);
        assert!(c < a);
    }

    #[test]
    fn test_swift_member_versions() {
        assert_eq!(
            PlatformVersion::from_swift_member("v12").unwrap().to_string(),
            "12.0"
        );
        assert_eq!(
            PlatformVersion::from_swift_member("v10_14").unwrap().to_string(),
            "10.14"
        );
        assert!(PlatformVersion::from_swift_member("twelve").is_none());
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::from_swift_name("iOS"), Some(Platform::IOS));
        assert_eq!(Platform::from_swift_name("linux"), None);
        assert_eq!("macOS".parse::<Platform>().unwrap(), Platform::MacOS);
    }

    #[test]
    fn test_requirement_from_cli() {
        let req: PlatformRequirement = "ios=13.0".parse().unwrap();
        assert_eq!(req.platform, Platform::IOS);
        assert_eq!(req.min_version.to_string(), "13.0");
        assert!("ios".parse::<PlatformRequirement>().is_err());
    }
}
