//! From-scratch schema install.
//!
//! An install runs these steps, each in its own transaction:
//!
//! 1. teardown of a previous installation (only with `overwrite`)
//! 2. the configured bootstrap scripts, in order, rewritten to the target
//!    namespace
//! 3. one bulk load per reference CSV file
//! 4. the initial metadata record
//!
//! Everything that can be checked without writing (script files present,
//! reference directory readable, target namespaces free) is checked first.

use crate::error::{MigrateError, MigrateResult};
use crate::lock::with_schema_lock;
use crate::metadata;
use crate::namespace::{NamespaceRewriter, RewriteMode};
use crate::progress::{LogProgress, ProgressSink, StepOutcome};
use crate::reference::{self, ReferenceTable};
use crate::report::RunReport;
use std::future::Future;
use std::path::{Path, PathBuf};
use strata_core::config::TypeConfig;
use strata_core::sql_utils::quote_ident;
use strata_core::{Config, SchemaName, SchemaVersion};
use strata_db::{with_transaction, Database, TabularSource};

/// Step name used for the teardown transaction.
pub const TEARDOWN_STEP: &str = "teardown";

/// Step name used for the metadata record transaction.
pub const METADATA_STEP: &str = "metadata";

/// Where reference data comes from and where it goes.
#[derive(Debug, Clone)]
pub struct ReferencePlan {
    /// Directory of CSV files
    pub dir: PathBuf,
    /// Lookup tables live in `<schema>_<schema_suffix>`
    pub schema_suffix: String,
    /// The three target columns; the first is the conflict key
    pub columns: Vec<String>,
}

/// Resolved install layout for one build.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    /// Namespace name hardcoded in the scripts
    pub default_schema: SchemaName,
    /// Directory the scripts are relative to
    pub sql_dir: PathBuf,
    /// Ordered bootstrap scripts
    pub scripts: Vec<String>,
    /// Dependent schema suffixes, in teardown order
    pub dependent_schemas: Vec<String>,
    /// Custom types dropped after every schema
    pub types: Vec<TypeConfig>,
    /// Reference data, if any
    pub reference: Option<ReferencePlan>,
    /// Advisory lock table
    pub lock_table: String,
}

impl InstallPlan {
    /// Resolve the install section of `config` against the project `root`.
    pub fn from_config(config: &Config, root: &Path) -> Self {
        let reference = config.install.reference.as_ref().and_then(|r| {
            config.reference_dir_absolute(root).map(|dir| ReferencePlan {
                dir,
                schema_suffix: r.schema_suffix.clone(),
                columns: r.columns.clone(),
            })
        });
        Self {
            default_schema: config.schema.name.clone(),
            sql_dir: config.sql_dir_absolute(root),
            scripts: config.install.scripts.clone(),
            dependent_schemas: config.install.teardown.schemas.clone(),
            types: config.install.teardown.types.clone(),
            reference,
            lock_table: config.install.lock_table.clone(),
        }
    }

    /// Namespaces an installation under `schema` owns, in teardown order.
    ///
    /// Dependent schemas come first, then the base schema, then the
    /// reference schema.
    pub fn namespaces(&self, schema: &SchemaName) -> Vec<String> {
        let reference_suffix = self.reference.as_ref().map(|r| r.schema_suffix.as_str());
        let mut names: Vec<String> = self
            .dependent_schemas
            .iter()
            .filter(|suffix| Some(suffix.as_str()) != reference_suffix)
            .map(|suffix| schema.child(suffix))
            .collect();
        names.push(schema.to_string());
        if let Some(suffix) = reference_suffix {
            names.push(schema.child(suffix));
        }
        names
    }

    /// Drop script for a previous installation under `schema`.
    ///
    /// Every statement tolerates a missing object. Type drops are rendered by
    /// `db`, since not every engine knows every kind of type object.
    pub fn teardown_sql(&self, db: &dyn Database, schema: &SchemaName) -> String {
        let rewriter = NamespaceRewriter::new(&self.default_schema, schema, RewriteMode::Install);
        let mut statements: Vec<String> = self
            .namespaces(schema)
            .iter()
            .map(|ns| format!("DROP SCHEMA IF EXISTS {} CASCADE;", quote_ident(ns)))
            .collect();
        statements.extend(
            self.types
                .iter()
                .map(|ty| format!("{};", db.drop_type_sql(ty.kind, &rewriter.rewrite(&ty.name)))),
        );
        statements.join("\n")
    }
}

/// Parameters of one install run.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Namespace to install into
    pub schema: SchemaName,
    /// Version recorded once the install completes
    pub version: SchemaVersion,
    /// Drop a previous installation first
    pub overwrite: bool,
}

struct Script {
    name: String,
    sql: String,
}

/// Runs an [`InstallPlan`] against a database.
pub struct Installer<'a> {
    db: &'a dyn Database,
    plan: &'a InstallPlan,
    source: &'a dyn TabularSource,
    progress: &'a dyn ProgressSink,
}

impl<'a> Installer<'a> {
    /// Create an installer reporting progress to the log.
    pub fn new(db: &'a dyn Database, plan: &'a InstallPlan, source: &'a dyn TabularSource) -> Self {
        Self {
            db,
            plan,
            source,
            progress: &LogProgress,
        }
    }

    /// Report progress to `progress` instead of the log.
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Install the schema.
    ///
    /// Fails with [`MigrateError::Precondition`] before writing anything when
    /// a target namespace exists and `overwrite` is off. A failing step is
    /// rolled back and reported as [`MigrateError::Install`] naming the step.
    pub async fn install(&self, options: &InstallOptions) -> MigrateResult<RunReport> {
        let (scripts, tables) = self.preflight(options).await?;

        with_schema_lock(
            self.db,
            &self.plan.lock_table,
            options.schema.as_str(),
            self.run(options, scripts, tables),
        )
        .await
    }

    /// Check everything that can be checked without writing.
    async fn preflight(&self, options: &InstallOptions) -> MigrateResult<(Vec<Script>, Vec<ReferenceTable>)> {
        let mut scripts = Vec::with_capacity(self.plan.scripts.len());
        for name in &self.plan.scripts {
            let path = self.plan.sql_dir.join(name);
            let sql = std::fs::read_to_string(&path).map_err(|e| {
                MigrateError::Configuration(format!(
                    "cannot read install script {}: {e}",
                    path.display()
                ))
            })?;
            scripts.push(Script {
                name: name.clone(),
                sql,
            });
        }

        let tables = match &self.plan.reference {
            Some(reference) => reference::discover_tables(&reference.dir)?,
            None => Vec::new(),
        };

        if !options.overwrite {
            self.ensure_target_free(&options.schema).await?;
        }
        Ok((scripts, tables))
    }

    async fn ensure_target_free(&self, schema: &SchemaName) -> MigrateResult<()> {
        let mut existing = Vec::new();
        for ns in self.plan.namespaces(schema) {
            if self.db.schema_exists(&ns).await? {
                existing.push(ns);
            }
        }
        if existing.is_empty() {
            return Ok(());
        }
        Err(MigrateError::Precondition(format!(
            "schema {schema} is already installed (existing: {}); use overwrite to reinstall",
            existing.join(", ")
        )))
    }

    async fn run(
        &self,
        options: &InstallOptions,
        scripts: Vec<Script>,
        tables: Vec<ReferenceTable>,
    ) -> MigrateResult<RunReport> {
        let schema = &options.schema;
        let db = self.db;

        if options.overwrite {
            log::info!("Dropping any previous installation of schema {schema}");
            let teardown = self.plan.teardown_sql(db, schema);
            self.step(TEARDOWN_STEP, async {
                db.execute_batch(&teardown).await.map_err(MigrateError::from)
            })
            .await?;
        } else {
            self.ensure_target_free(schema).await?;
        }

        let rewriter =
            NamespaceRewriter::new(&self.plan.default_schema, schema, RewriteMode::Install);
        let mut applied = 0;

        for script in &scripts {
            if script.sql.trim().is_empty() {
                log::warn!("Install script {} is empty, skipping", script.name);
                self.progress.step(&script.name, StepOutcome::Skipped);
                continue;
            }
            let sql = rewriter.rewrite(&script.sql);
            self.step(&script.name, async {
                db.execute_batch(&sql).await.map_err(MigrateError::from)
            })
            .await?;
            applied += 1;
        }

        if let Some(reference) = &self.plan.reference {
            let target = schema.child(&reference.schema_suffix);
            for table in &tables {
                let name = format!("{}.{}", target, table.name);
                self.step(&name, self.load_table(&target, table, &reference.columns))
                    .await?;
                applied += 1;
            }
        }

        self.step(
            METADATA_STEP,
            metadata::record_version(db, schema, options.version, metadata::now()),
        )
        .await?;

        let message = format!("schema {schema} installed at version {}", options.version);
        self.progress.info(&message);
        Ok(RunReport::success(options.version, applied, message))
    }

    async fn load_table(&self, target: &str, table: &ReferenceTable, columns: &[String]) -> MigrateResult<()> {
        let rows = reference::load_rows(self.source, table)?;
        log::debug!("Loading {} rows into {target}.{}", rows.len(), table.name);
        self.db
            .execute_batch(&reference::insert_sql(target, &table.name, columns, &rows))
            .await?;
        Ok(())
    }

    /// Run one named step in its own transaction and report its outcome.
    async fn step<F>(&self, name: &str, body: F) -> MigrateResult<()>
    where
        F: Future<Output = MigrateResult<()>>,
    {
        log::info!("Install step {name}");
        match with_transaction(self.db, body).await {
            Ok(()) => {
                self.progress.step(name, StepOutcome::Success);
                Ok(())
            }
            Err(err) => {
                self.progress.step(name, StepOutcome::Failed);
                Err(err.in_install_step(name))
            }
        }
    }
}

#[cfg(test)]
#[path = "install_test.rs"]
mod tests;
