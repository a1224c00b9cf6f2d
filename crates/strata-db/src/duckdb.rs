//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Row};
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use strata_core::config::TypeKind;

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        log::debug!("execute: {sql}");
        let conn = self.lock()?;
        conn.execute(sql, []).map_err(DbError::from)
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        log::debug!("execute_batch: {} bytes", sql.len());
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    fn query_rows_sync(&self, sql: &str) -> DbResult<Vec<Row>> {
        log::debug!("query: {sql}");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let width = row.as_ref().column_count();
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                let value: Value = row.get(idx)?;
                values.push(value_to_text(value));
            }
            out.push(values);
        }
        Ok(out)
    }

    fn count_sync(&self, sql: &str) -> DbResult<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Render a DuckDB value as text, `None` for NULL.
fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(s) => Some(s),
        Value::Boolean(b) => Some(b.to_string()),
        Value::TinyInt(n) => Some(n.to_string()),
        Value::SmallInt(n) => Some(n.to_string()),
        Value::Int(n) => Some(n.to_string()),
        Value::BigInt(n) => Some(n.to_string()),
        Value::HugeInt(n) => Some(n.to_string()),
        Value::UTinyInt(n) => Some(n.to_string()),
        Value::USmallInt(n) => Some(n.to_string()),
        Value::UInt(n) => Some(n.to_string()),
        Value::UBigInt(n) => Some(n.to_string()),
        Value::Float(n) => Some(n.to_string()),
        Value::Double(n) => Some(n.to_string()),
        other => Some(format!("{other:?}")),
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>> {
        self.query_rows_sync(sql)
    }

    async fn schema_exists(&self, schema: &str) -> DbResult<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = '{}'",
            schema.replace('\'', "''")
        );
        Ok(self.count_sync(&sql)? > 0)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{}' AND table_name = '{}'",
            schema.replace('\'', "''"),
            table.replace('\'', "''")
        );
        Ok(self.count_sync(&sql)? > 0)
    }

    fn drop_type_sql(&self, _kind: TypeKind, name: &str) -> String {
        // DuckDB has no DROP DOMAIN; domains are created as plain types
        format!("DROP TYPE IF EXISTS {name}")
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
