//! Upgrade an installed schema to the build's declared version.
//!
//! A run moves through `VALIDATE -> (NO-OP | APPLY -> FINALIZE) -> DONE`:
//!
//! - validate: the schema must be installed and not ahead of the target
//! - apply: each pending `upgrade_to_<N>.sql` runs in its own transaction
//!   together with the metadata update to `N`, so the recorded version always
//!   matches the last step that committed
//! - finalize: the target version is recorded once more
//!
//! A failing step is rolled back and stops the run; later steps never run.

use crate::catalog::{MigrationFile, VersionCatalog};
use crate::error::{MigrateError, MigrateResult};
use crate::lock::with_schema_lock;
use crate::metadata;
use crate::namespace::{NamespaceRewriter, RewriteMode};
use crate::progress::{LogProgress, ProgressSink, StepOutcome};
use crate::report::RunReport;
use chrono::NaiveDateTime;
use strata_core::{SchemaName, SchemaVersion};
use strata_db::{with_transaction, Database};

/// Message of a run that found nothing to do.
pub const UP_TO_DATE: &str = "already up to date";

/// Parameters of one upgrade run.
#[derive(Debug, Clone)]
pub struct UpgradeOptions {
    /// Installed namespace to upgrade
    pub schema: SchemaName,
    /// Version the build declares
    pub target: SchemaVersion,
}

/// What an upgrade run would do.
#[derive(Debug, Clone)]
pub struct UpgradePlan {
    pub current: SchemaVersion,
    pub target: SchemaVersion,
    /// Files above `current` and up to `target`, ascending
    pub pending: Vec<MigrationFile>,
}

impl UpgradePlan {
    /// True when the installed version already equals the target.
    pub fn is_noop(&self) -> bool {
        self.current == self.target
    }
}

/// Drives upgrade runs against one database.
pub struct Upgrader<'a> {
    db: &'a dyn Database,
    catalog: &'a VersionCatalog,
    default_schema: SchemaName,
    lock_table: String,
    progress: &'a dyn ProgressSink,
}

impl<'a> Upgrader<'a> {
    /// Create an upgrader reporting progress to the log.
    ///
    /// `default_schema` is the namespace name hardcoded in the upgrade files.
    pub fn new(
        db: &'a dyn Database,
        catalog: &'a VersionCatalog,
        default_schema: SchemaName,
        lock_table: impl Into<String>,
    ) -> Self {
        Self {
            db,
            catalog,
            default_schema,
            lock_table: lock_table.into(),
            progress: &LogProgress,
        }
    }

    /// Report progress to `progress` instead of the log.
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Validate and compute the pending steps without writing anything.
    pub async fn plan(&self, options: &UpgradeOptions) -> MigrateResult<UpgradePlan> {
        let schema = &options.schema;
        let target = options.target;
        let current = metadata::current_version(self.db, schema)
            .await?
            .ok_or_else(|| {
                MigrateError::Precondition(format!(
                    "no installation found in schema {schema}; install it first"
                ))
            })?;

        if current > target {
            return Err(MigrateError::Precondition(format!(
                "schema {schema} is at version {current}, newer than this build's version {target}"
            )));
        }
        if current == target {
            return Ok(UpgradePlan {
                current,
                target,
                pending: Vec::new(),
            });
        }

        let (pending, beyond): (Vec<_>, Vec<_>) = self
            .catalog
            .list_migrations(Some(current))?
            .into_iter()
            .partition(|m| m.target_version <= target);
        for file in &beyond {
            log::warn!(
                "Ignoring {}: above this build's version {target}",
                file.file_name()
            );
        }

        Ok(UpgradePlan {
            current,
            target,
            pending,
        })
    }

    /// Upgrade `options.schema` to `options.target`.
    ///
    /// Returns an "already up to date" report without executing any statement
    /// when there is nothing to do.
    pub async fn upgrade(&self, options: &UpgradeOptions) -> MigrateResult<RunReport> {
        let plan = self.plan(options).await?;
        if plan.is_noop() {
            return Ok(self.up_to_date(&plan));
        }

        with_schema_lock(
            self.db,
            &self.lock_table,
            options.schema.as_str(),
            self.apply(options),
        )
        .await
    }

    fn up_to_date(&self, plan: &UpgradePlan) -> RunReport {
        self.progress.info(UP_TO_DATE);
        RunReport::success(plan.current, 0, UP_TO_DATE)
    }

    async fn apply(&self, options: &UpgradeOptions) -> MigrateResult<RunReport> {
        // Another run may have finished while the lock was contended
        let plan = self.plan(options).await?;
        if plan.is_noop() {
            return Ok(self.up_to_date(&plan));
        }

        let schema = &options.schema;
        let rewriter =
            NamespaceRewriter::new(&self.default_schema, schema, RewriteMode::Upgrade);
        log::info!(
            "Upgrading schema {schema} from {} to {} ({} files)",
            plan.current,
            plan.target,
            plan.pending.len()
        );

        let mut applied = 0;
        for migration in &plan.pending {
            let name = migration.file_name();
            let sql = migration
                .read_sql()
                .map_err(|e| e.in_upgrade_file(&name))?;
            if sql.trim().is_empty() {
                log::warn!("Upgrade file {name} is empty, skipping");
                self.progress.step(&name, StepOutcome::Skipped);
                continue;
            }

            let script = step_script(
                &rewriter.rewrite(&sql),
                schema,
                migration.target_version,
                metadata::now(),
            );
            let db = self.db;
            let result = with_transaction(db, async {
                db.execute_batch(&script).await.map_err(MigrateError::from)
            })
            .await;

            match result {
                Ok(()) => {
                    log::info!("Applied {name}");
                    self.progress.step(&name, StepOutcome::Success);
                    applied += 1;
                }
                Err(err) => {
                    self.progress.step(&name, StepOutcome::Failed);
                    return Err(err.in_upgrade_file(name));
                }
            }
        }

        with_transaction(
            self.db,
            metadata::record_version(self.db, schema, plan.target, metadata::now()),
        )
        .await?;

        let message = format!(
            "schema {schema} upgraded from {} to {} ({applied} applied)",
            plan.current, plan.target
        );
        self.progress.info(&message);
        Ok(RunReport::success(plan.target, applied, message))
    }
}

/// Upgrade script followed by the metadata update to `version`.
fn step_script(sql: &str, schema: &SchemaName, version: SchemaVersion, at: NaiveDateTime) -> String {
    let body = sql.trim_end();
    let terminator = if body.ends_with(';') { "" } else { "\n;" };
    format!(
        "{body}{terminator}\n{};\n",
        metadata::update_version_sql(schema, version, at)
    )
}

#[cfg(test)]
#[path = "upgrade_test.rs"]
mod tests;
