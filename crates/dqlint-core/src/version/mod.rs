//! Supported schema versions

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Catalog revisions the engine knows about
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V19,
    V20,
    #[default]
    V21,
}

impl SchemaVersion {
    /// Every supported version, oldest first
    pub const ALL: [SchemaVersion; 3] = [SchemaVersion::V19, SchemaVersion::V20, SchemaVersion::V21];

    /// The newest supported version
    pub fn latest() -> Self {
        SchemaVersion::V21
    }

    /// Identifier used for artifact file names (`v21.json`)
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V19 => "v19",
            SchemaVersion::V20 => "v20",
            SchemaVersion::V21 => "v21",
        }
    }

    /// Artifact bundled into the library for this version
    pub(crate) fn bundled_artifact(&self) -> &'static str {
        match self {
            SchemaVersion::V19 => include_str!("../../schemas/v19.json"),
            SchemaVersion::V20 => include_str!("../../schemas/v20.json"),
            SchemaVersion::V21 => include_str!("../../schemas/v21.json"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let number = lowered.strip_prefix('v').unwrap_or(&lowered);
        match number {
            "19" => Ok(SchemaVersion::V19),
            "20" => Ok(SchemaVersion::V20),
            "21" => Ok(SchemaVersion::V21),
            _ => Err(format!(
                "Unknown schema version: '{}'. Supported versions: v19, v20, v21.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!("v19".parse::<SchemaVersion>(), Ok(SchemaVersion::V19));
        assert_eq!("V20".parse::<SchemaVersion>(), Ok(SchemaVersion::V20));
        assert_eq!("21".parse::<SchemaVersion>(), Ok(SchemaVersion::V21));
    }

    #[test]
    fn test_parse_unknown_version() {
        let err = "v7".parse::<SchemaVersion>().unwrap_err();
        assert!(err.contains("v7"));
        assert!(err.contains("v19, v20, v21"));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for version in SchemaVersion::ALL {
            assert_eq!(version.to_string().parse::<SchemaVersion>(), Ok(version));
        }
        assert_eq!(SchemaVersion::default(), SchemaVersion::latest());
    }
}
