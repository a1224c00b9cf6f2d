//! The authoritative installed-version record.
//!
//! Each installed namespace carries a `metadata` table with columns
//! `id`, `version`, `version_date` and `status` (`1` = active). Reads select
//! the most recently dated active row, so tables that accumulated history
//! rows stay readable; writes update the active row in place and insert one
//! only when none exists.
//!
//! Nothing else in the engine reads or writes this table.

use crate::error::{MigrateError, MigrateResult};
use chrono::{NaiveDateTime, Timelike, Utc};
use strata_core::{SchemaName, SchemaVersion};
use strata_db::Database;

/// Name of the metadata table inside each installed namespace.
pub const METADATA_TABLE: &str = "metadata";

/// `status` value of the active record.
pub const ACTIVE_STATUS: i32 = 1;

/// Current UTC time truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

fn table(schema: &SchemaName) -> String {
    format!("{schema}.{METADATA_TABLE}")
}

fn timestamp_literal(at: NaiveDateTime) -> String {
    format!("TIMESTAMP '{}'", at.format("%Y-%m-%d %H:%M:%S"))
}

/// Read the installed version of `schema`.
///
/// Returns `None` when the metadata table does not exist or has no active
/// row. An active row whose version is not a positive integer is a corrupt
/// installation and fails with [`MigrateError::Configuration`].
pub async fn current_version(
    db: &dyn Database,
    schema: &SchemaName,
) -> MigrateResult<Option<SchemaVersion>> {
    if !db.relation_exists(&table(schema)).await? {
        log::debug!("No metadata table in schema {schema}");
        return Ok(None);
    }

    let sql = format!(
        "SELECT CAST(version AS VARCHAR) FROM {} WHERE status = {ACTIVE_STATUS} \
         ORDER BY version_date DESC, id DESC LIMIT 1",
        table(schema)
    );
    let rows = db.query_rows(&sql).await?;
    let Some(raw) = rows.into_iter().next().and_then(|row| row.into_iter().next().flatten())
    else {
        return Ok(None);
    };

    raw.parse::<SchemaVersion>().map(Some).map_err(|_| {
        MigrateError::Configuration(format!(
            "metadata in schema {schema} holds version '{raw}', which is not a positive integer"
        ))
    })
}

/// DDL for the metadata table, if it does not exist yet.
pub fn create_table_sql(schema: &SchemaName) -> String {
    format!(
        "CREATE SCHEMA IF NOT EXISTS {schema};\n\
         CREATE TABLE IF NOT EXISTS {} (\n\
             id INTEGER PRIMARY KEY,\n\
             version VARCHAR NOT NULL,\n\
             version_date TIMESTAMP NOT NULL,\n\
             status INTEGER NOT NULL DEFAULT {ACTIVE_STATUS}\n\
         );",
        table(schema)
    )
}

/// Statement moving every active record to `version`.
///
/// Appended to each upgrade script so the version moves in the same
/// transaction as the data it describes.
pub fn update_version_sql(schema: &SchemaName, version: SchemaVersion, at: NaiveDateTime) -> String {
    format!(
        "UPDATE {} SET version = '{version}', version_date = {} WHERE status = {ACTIVE_STATUS}",
        table(schema),
        timestamp_literal(at)
    )
}

fn insert_version_sql(schema: &SchemaName, version: SchemaVersion, at: NaiveDateTime) -> String {
    format!(
        "INSERT INTO {t} (id, version, version_date, status) \
         SELECT COALESCE(MAX(id), 0) + 1, '{version}', {}, {ACTIVE_STATUS} FROM {t}",
        timestamp_literal(at),
        t = table(schema)
    )
}

/// Make `version` the installed version of `schema`.
///
/// Creates the table when missing, updates the active record in place, and
/// inserts one when there is none. Does not open a transaction; callers
/// scope it together with whatever the version describes.
pub async fn record_version(
    db: &dyn Database,
    schema: &SchemaName,
    version: SchemaVersion,
    at: NaiveDateTime,
) -> MigrateResult<()> {
    db.execute_batch(&create_table_sql(schema)).await?;
    let updated = db.execute(&update_version_sql(schema, version, at)).await?;
    if updated == 0 {
        db.execute(&insert_version_sql(schema, version, at)).await?;
    }
    log::debug!("Recorded version {version} for schema {schema}");
    Ok(())
}

/// Number of active records; 1 for a healthy installation.
pub async fn active_record_count(db: &dyn Database, schema: &SchemaName) -> MigrateResult<usize> {
    if !db.relation_exists(&table(schema)).await? {
        return Ok(0);
    }
    let rows = db
        .query_rows(&format!(
            "SELECT COUNT(*) FROM {} WHERE status = {ACTIVE_STATUS}",
            table(schema)
        ))
        .await?;
    Ok(rows
        .first()
        .and_then(|row| row.first().cloned().flatten())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0))
}

#[cfg(test)]
#[path = "metadata_test.rs"]
mod tests;
