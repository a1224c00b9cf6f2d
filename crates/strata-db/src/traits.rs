//! Database trait definitions

use crate::error::DbResult;
use async_trait::async_trait;
use std::path::Path;
use strata_core::config::TypeKind;

/// One result row, every column rendered as text (`None` for SQL NULL).
pub type Row = Vec<Option<String>>;

/// Execution boundary between the migration engine and a live database.
///
/// Implementations must be Send + Sync for async operation. Statements are
/// executed sequentially on a single connection; callers own transaction
/// scoping (see [`crate::with_transaction`]).
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a single statement, returning the affected row count
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute a script of one or more statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and return every row as text columns
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>>;

    /// Check whether a namespace (schema) exists
    async fn schema_exists(&self, schema: &str) -> DbResult<bool>;

    /// Check if a table or view exists (`schema.table` or bare name)
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// `DROP` statement for a custom type that tolerates a missing object
    fn drop_type_sql(&self, kind: TypeKind, name: &str) -> String {
        format!("DROP {} IF EXISTS {name}", kind.keyword())
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Reader for delimited reference-data files.
pub trait TabularSource: Send + Sync {
    /// Read `path` as ordered rows of exactly `width` text fields.
    ///
    /// Missing trailing fields and empty fields are returned as `None`.
    fn read_rows(&self, path: &Path, width: usize) -> DbResult<Vec<Row>>;
}
