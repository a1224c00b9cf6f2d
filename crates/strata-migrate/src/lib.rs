//! Schema install and upgrade engine.
//!
//! Tracks the installed version of a relational schema, discovers the
//! `upgrade_to_<N>.sql` files needed to reach the build's declared version,
//! and applies them one transaction per step. All SQL goes through
//! [`strata_db::Database`].
//!
//! - [`catalog`]: discovery and ordering of upgrade files
//! - [`metadata`]: the single authoritative version record
//! - [`install`]: from-scratch install (teardown, scripts, reference data)
//! - [`upgrade`]: the upgrade state machine

pub mod catalog;
pub mod error;
pub mod install;
pub mod lock;
pub mod metadata;
pub mod namespace;
pub mod progress;
pub mod reference;
pub mod report;
pub mod upgrade;

pub use catalog::{MigrationFile, VersionCatalog};
pub use error::{MigrateError, MigrateResult};
pub use install::{InstallOptions, InstallPlan, Installer};
pub use progress::{LogProgress, ProgressRecorder, ProgressSink, StepOutcome};
pub use report::{RunReport, RunStatus};
pub use upgrade::{UpgradeOptions, UpgradePlan, Upgrader};
