//! strata-db - Database abstraction layer for Strata
//!
//! The migration engine talks to a database through exactly two seams: the
//! [`Database`] trait ("execute this SQL text, return rows or fail") and the
//! [`TabularSource`] trait ("read this file as ordered rows of text fields").
//! DuckDB implementations of both are provided.

pub mod csv;
pub mod duckdb;
pub mod error;
pub mod traits;
pub mod transaction;

pub use csv::DuckDbCsvSource;
pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, Row, TabularSource};
pub use transaction::with_transaction;
