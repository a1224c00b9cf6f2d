//! Advisory progress notifications.
//!
//! The installer and upgrader report each script, table and upgrade file
//! they process. Sinks are for observability only; nothing depends on them.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

/// Outcome of one processed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Success,
    Skipped,
    Failed,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Success => write!(f, "success"),
            StepOutcome::Skipped => write!(f, "skipped"),
            StepOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Receiver of progress notifications.
pub trait ProgressSink: Send + Sync {
    /// A named step finished with `outcome`.
    fn step(&self, name: &str, outcome: StepOutcome);

    /// A free-form informational message.
    fn info(&self, _message: &str) {}
}

/// Forwards notifications to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn step(&self, name: &str, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Failed => log::error!("{name}: {outcome}"),
            StepOutcome::Skipped => log::warn!("{name}: {outcome}"),
            StepOutcome::Success => log::info!("{name}: {outcome}"),
        }
    }

    fn info(&self, message: &str) {
        log::info!("{message}");
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct ProgressRecorder {
    steps: Mutex<Vec<(String, StepOutcome)>>,
}

impl ProgressRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps recorded so far, in order
    pub fn steps(&self) -> Vec<(String, StepOutcome)> {
        self.steps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Names of steps that ended with `outcome`
    pub fn names_with(&self, outcome: StepOutcome) -> Vec<String> {
        self.steps()
            .into_iter()
            .filter(|(_, o)| *o == outcome)
            .map(|(name, _)| name)
            .collect()
    }
}

impl ProgressSink for ProgressRecorder {
    fn step(&self, name: &str, outcome: StepOutcome) {
        self.steps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((name.to_string(), outcome));
    }
}
