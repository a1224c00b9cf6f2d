//! Shared utilities for CLI commands

use anyhow::Result;
use std::fmt;
use strata_core::SchemaVersion;
use strata_migrate::{MigrateError, MigrateResult, ProgressSink, RunReport, StepOutcome};

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run and the database is closed cleanly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: the failure has already been printed by the command
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Exit code for an unmet precondition (nothing was changed).
pub(crate) const EXIT_PRECONDITION: u8 = 2;

/// Exit code for a failure while executing against the database.
pub(crate) const EXIT_ENGINE: u8 = 4;

/// Exit code for a migration engine error.
pub(crate) fn exit_code_for(err: &MigrateError) -> u8 {
    if err.is_precondition() {
        EXIT_PRECONDITION
    } else {
        EXIT_ENGINE
    }
}

/// Progress printed as one line per step.
pub(crate) struct ConsoleProgress {
    quiet: bool,
}

impl ConsoleProgress {
    /// Create a sink; a quiet sink prints nothing (JSON output mode)
    pub(crate) fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressSink for ConsoleProgress {
    fn step(&self, name: &str, outcome: StepOutcome) {
        if self.quiet {
            return;
        }
        match outcome {
            StepOutcome::Success => println!("  ✓ {name}"),
            StepOutcome::Skipped => println!("  - {name} (empty, skipped)"),
            StepOutcome::Failed => println!("  ✗ {name}"),
        }
    }
}

/// Print the outcome of an install or upgrade run.
///
/// `version` is the last known installed version, reported on failure.
pub(crate) fn finish(
    result: MigrateResult<RunReport>,
    json: bool,
    version: Option<SchemaVersion>,
) -> Result<()> {
    match result {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!();
                println!("{}", report.message);
            }
            Ok(())
        }
        Err(err) => {
            if json {
                let report = RunReport::failure(version, err.to_string());
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                eprintln!("Error: {err}");
            }
            Err(ExitCode(exit_code_for(&err)).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&MigrateError::Precondition("x".into())),
            EXIT_PRECONDITION
        );
        assert_eq!(
            exit_code_for(&MigrateError::Locked {
                schema: "water".into(),
                holder: "pid 1".into()
            }),
            EXIT_PRECONDITION
        );
        let wrapped = MigrateError::Configuration("bad".into()).in_upgrade_file("upgrade_to_2.sql");
        assert_eq!(exit_code_for(&wrapped), EXIT_ENGINE);
    }

    #[test]
    fn test_finish_maps_error_to_exit_code() {
        let err = finish(Err(MigrateError::Precondition("installed".into())), true, None)
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ExitCode>().map(|c| c.0), Some(EXIT_PRECONDITION));
    }
}
