//! Strongly-typed namespace name.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Name of a relational namespace (schema) the engine installs into.
///
/// Scripts reference the namespace unquoted, so only plain identifiers
/// (`[A-Za-z_][A-Za-z0-9_]*`) are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate and wrap a schema name.
    pub fn parse(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start {
            return Err(CoreError::InvalidSchemaName {
                reason: "must start with a letter or underscore".to_string(),
                name,
            });
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CoreError::InvalidSchemaName {
                reason: "only ASCII letters, digits and underscores are allowed".to_string(),
                name,
            });
        }
        Ok(Self(name))
    }

    /// Name of a dependent namespace, `<self>_<suffix>`.
    pub fn child(&self, suffix: &str) -> String {
        format!("{}_{}", self.0, suffix)
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SchemaName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SchemaName::parse(s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SchemaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for SchemaName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SchemaName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SchemaName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SchemaName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
