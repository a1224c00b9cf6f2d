//! Structured result of an install or upgrade run.

use serde::Serialize;
use std::fmt;
use strata_core::SchemaVersion;

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failure => write!(f, "failure"),
        }
    }
}

/// `{status, version, message}` plus the number of steps applied.
///
/// The engine only returns successful reports; failures travel as
/// [`crate::MigrateError`]. Hosts that need a uniform shape build a failure
/// report from the error with [`RunReport::failure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub version: Option<SchemaVersion>,
    pub message: String,
    pub steps_applied: usize,
}

impl RunReport {
    /// A successful run ending at `version`
    pub fn success(version: SchemaVersion, steps_applied: usize, message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Success,
            version: Some(version),
            message: message.into(),
            steps_applied,
        }
    }

    /// A failed run; `version` is the last known installed version
    pub fn failure(version: Option<SchemaVersion>, message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failure,
            version,
            message: message.into(),
            steps_applied: 0,
        }
    }

    /// True for a successful run
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
