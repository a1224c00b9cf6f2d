//! Schema version numbers.
//!
//! A [`SchemaVersion`] is a strictly positive integer with a plain numeric
//! total order. It is unrelated to the dotted display version of the tool
//! itself; see [`display_version_key`] for that.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Installed or target version of a database schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchemaVersion(NonZeroU32);

impl SchemaVersion {
    /// Create a version, returning `None` for zero.
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// Return the numeric value.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SchemaVersion {
    type Err = CoreError;

    /// Parse a base-10 integer, tolerating surrounding whitespace.
    fn from_str(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| CoreError::InvalidVersion {
                value: trimmed.to_string(),
            })
    }
}

impl TryFrom<u32> for SchemaVersion {
    type Error = CoreError;

    fn try_from(value: u32) -> CoreResult<Self> {
        Self::new(value).ok_or_else(|| CoreError::InvalidVersion {
            value: value.to_string(),
        })
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u32::deserialize(deserializer)?;
        Self::new(value)
            .ok_or_else(|| serde::de::Error::custom("schema version must be greater than 0"))
    }
}

/// Turn a dotted display version into a sortable key.
///
/// Each component is left-padded to two digits: `"0.1.2"` becomes `"000102"`
/// and `"10.9.12"` becomes `"100912"`. A leading `v` is ignored.
pub fn display_version_key(version: &str) -> String {
    version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .map(|part| format!("{:0>2}", part))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!("12".parse::<SchemaVersion>().unwrap().get(), 12);
        assert_eq!(" 7\n".parse::<SchemaVersion>().unwrap().get(), 7);
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert!("0".parse::<SchemaVersion>().is_err());
        assert!("-3".parse::<SchemaVersion>().is_err());
        assert!("1.2".parse::<SchemaVersion>().is_err());
        assert!("".parse::<SchemaVersion>().is_err());
    }

    #[test]
    fn test_numeric_ordering() {
        let v9 = SchemaVersion::new(9).unwrap();
        let v10 = SchemaVersion::new(10).unwrap();
        assert!(v9 < v10);
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_yaml::from_str::<SchemaVersion>("0").is_err());
        let v: SchemaVersion = serde_yaml::from_str("4").unwrap();
        assert_eq!(v.get(), 4);
    }

    #[test]
    fn test_display_version_key() {
        assert_eq!(display_version_key("0.1.2"), "000102");
        assert_eq!(display_version_key("10.9.12"), "100912");
        assert_eq!(display_version_key("v1.0.0"), "010000");
    }
}
