//! DuckDB-backed reader for reference-data CSV files.

use crate::error::{DbError, DbResult};
use crate::traits::{Row, TabularSource};
use duckdb::Connection;
use std::path::Path;
use std::sync::Mutex;

/// Reads headerless, comma-delimited files through DuckDB's `read_csv`.
///
/// Uses a private in-memory connection so reading never touches the target
/// database.
pub struct DuckDbCsvSource {
    conn: Mutex<Connection>,
}

impl DuckDbCsvSource {
    /// Create a reader backed by a fresh in-memory connection
    pub fn new() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl TabularSource for DuckDbCsvSource {
    fn read_rows(&self, path: &Path, width: usize) -> DbResult<Vec<Row>> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| DbError::CsvError(format!("{}: {e}", path.display())))?;
        if metadata.len() == 0 || width == 0 {
            return Ok(Vec::new());
        }

        let columns = (0..width)
            .map(|i| format!("'c{i}': 'VARCHAR'"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT * FROM read_csv('{}', header = false, delim = ',', quote = '\"', \
             null_padding = true, columns = {{{columns}}})",
            path.display().to_string().replace('\'', "''")
        );

        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DbError::CsvError(format!("{}: {e}", path.display())))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| DbError::CsvError(format!("{}: {e}", path.display())))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| DbError::CsvError(format!("{}: {e}", path.display())))?
        {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                let value: Option<String> = row.get(idx)?;
                values.push(value);
            }
            out.push(values);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "materiau.csv",
            "fonte,Fonte,Fonte ductile\nacier,Acier,\"Acier, galvanisé\"\n",
        );

        let rows = DuckDbCsvSource::new().unwrap().read_rows(&path, 3).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].as_deref(), Some("fonte"));
        assert_eq!(rows[1][2].as_deref(), Some("Acier, galvanisé"));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "short.csv", "a,b,c\nonly_code\n");

        let rows = DuckDbCsvSource::new().unwrap().read_rows(&path, 3).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![Some("only_code".to_string()), None, None]);
    }

    #[test]
    fn test_empty_file_yields_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "empty.csv", "");
        let rows = DuckDbCsvSource::new().unwrap().read_rows(&path, 3).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_file_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DuckDbCsvSource::new()
            .unwrap()
            .read_rows(&dir.path().join("absent.csv"), 3)
            .unwrap_err();
        assert!(matches!(err, DbError::CsvError(_)));
    }
}
