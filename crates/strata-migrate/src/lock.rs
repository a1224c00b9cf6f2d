//! Advisory per-schema lock.
//!
//! A row keyed by schema name in the lock table marks a running install or
//! upgrade. The row is inserted before any work starts and deleted when the
//! work returns, whether it succeeded or not. A process that dies mid-run
//! leaves its row behind; remove it by hand once the holder is known dead.

use crate::error::{MigrateError, MigrateResult};
use crate::metadata;
use std::future::Future;
use strata_core::sql_utils::{escape_sql_string, quote_qualified};
use strata_db::Database;

fn create_table_sql(lock_table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n\
             schema_name VARCHAR PRIMARY KEY,\n\
             holder VARCHAR NOT NULL,\n\
             acquired_at TIMESTAMP NOT NULL\n\
         )",
        quote_qualified(lock_table)
    )
}

fn holder_id() -> String {
    format!("pid {} at {}", std::process::id(), metadata::now())
}

async fn current_holder(db: &dyn Database, lock_table: &str, schema: &str) -> MigrateResult<Option<String>> {
    let rows = db
        .query_rows(&format!(
            "SELECT holder FROM {} WHERE schema_name = '{}'",
            quote_qualified(lock_table),
            escape_sql_string(schema)
        ))
        .await?;
    Ok(rows.into_iter().next().and_then(|row| row.into_iter().next().flatten()))
}

async fn acquire(db: &dyn Database, lock_table: &str, schema: &str) -> MigrateResult<()> {
    db.execute_batch(&create_table_sql(lock_table)).await?;

    let holder = holder_id();
    let insert = format!(
        "INSERT INTO {} (schema_name, holder, acquired_at) VALUES ('{}', '{}', CAST(now() AS TIMESTAMP))",
        quote_qualified(lock_table),
        escape_sql_string(schema),
        escape_sql_string(&holder)
    );
    match db.execute(&insert).await {
        Ok(_) => {
            log::debug!("Acquired lock on schema {schema} ({holder})");
            Ok(())
        }
        Err(err) => match current_holder(db, lock_table, schema).await? {
            Some(holder) => Err(MigrateError::Locked {
                schema: schema.to_string(),
                holder,
            }),
            None => Err(err.into()),
        },
    }
}

async fn release(db: &dyn Database, lock_table: &str, schema: &str) {
    let delete = format!(
        "DELETE FROM {} WHERE schema_name = '{}'",
        quote_qualified(lock_table),
        escape_sql_string(schema)
    );
    match db.execute(&delete).await {
        Ok(_) => log::debug!("Released lock on schema {schema}"),
        Err(e) => log::warn!("Failed to release lock on schema {schema}: {e}"),
    }
}

/// Run `body` while holding the lock on `schema`.
///
/// Fails with [`MigrateError::Locked`] before `body` starts when another
/// caller holds the lock. The lock is released after `body` returns.
pub async fn with_schema_lock<T, Fut>(
    db: &dyn Database,
    lock_table: &str,
    schema: &str,
    body: Fut,
) -> MigrateResult<T>
where
    Fut: Future<Output = MigrateResult<T>>,
{
    acquire(db, lock_table, schema).await?;
    let result = body.await;
    release(db, lock_table, schema).await;
    result
}

/// Holder of the lock on `schema`, if any.
pub async fn lock_holder(db: &dyn Database, lock_table: &str, schema: &str) -> MigrateResult<Option<String>> {
    if !db.relation_exists(lock_table).await? {
        return Ok(None);
    }
    current_holder(db, lock_table, schema).await
}
