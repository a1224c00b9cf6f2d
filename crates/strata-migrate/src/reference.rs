//! Reference (lookup) data bulk load.
//!
//! Each CSV file in the reference directory fills the lookup table named
//! after its stem. Rows are `(code, label, description)` triples; the five
//! [`SENTINEL_ROWS`] are appended to every table and conflicts on `code` are
//! skipped, so reloading never duplicates a code.

use crate::error::{MigrateError, MigrateResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use strata_core::sql_utils::{quote_ident, sql_literal};
use strata_db::TabularSource;

/// Placeholder rows present in every lookup table.
pub const SENTINEL_ROWS: [(&str, &str, &str); 5] = [
    (
        "not_specified",
        "Not specified",
        "information being researched, or available but not entered",
    ),
    (
        "not_applicable",
        "Not applicable",
        "information impossible or irrelevant for the described element",
    ),
    (
        "not_validated",
        "Not validated",
        "information exists but has not been officially validated",
    ),
    (
        "undetermined",
        "Undetermined",
        "information unknown or unavailable and cannot be obtained",
    ),
    ("other", "Other", "not in the list above, see comment"),
];

/// One lookup row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub code: String,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl ReferenceRow {
    fn sentinel((code, label, description): (&str, &str, &str)) -> Self {
        Self {
            code: code.to_string(),
            label: Some(label.to_string()),
            description: Some(description.to_string()),
        }
    }
}

/// A lookup table and the file that fills it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTable {
    /// Table name (file stem)
    pub name: String,
    /// Source CSV file
    pub path: PathBuf,
}

/// List the `*.csv` files in `dir`, sorted by table name.
pub fn discover_tables(dir: &Path) -> MigrateResult<Vec<ReferenceTable>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        MigrateError::Configuration(format!(
            "cannot read reference directory {}: {e}",
            dir.display()
        ))
    })?;

    let mut tables = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || !path.extension().is_some_and(|e| e == "csv") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            tables.push(ReferenceTable {
                name: stem.to_string(),
                path,
            });
        }
    }
    tables.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tables)
}

/// Read a table's rows and append the sentinel rows.
///
/// Rows without a code are dropped, and only the first row for each code is
/// kept.
pub fn load_rows(source: &dyn TabularSource, table: &ReferenceTable) -> MigrateResult<Vec<ReferenceRow>> {
    let raw = source.read_rows(&table.path, 3)?;

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(raw.len() + SENTINEL_ROWS.len());
    let file_rows = raw.into_iter().filter_map(|fields| {
        let mut fields = fields.into_iter();
        let code = fields.next().flatten().filter(|c| !c.trim().is_empty());
        let label = fields.next().flatten();
        let description = fields.next().flatten();
        match code {
            Some(code) => Some(ReferenceRow {
                code,
                label,
                description,
            }),
            None => {
                log::warn!("{}: skipping row without a code", table.path.display());
                None
            }
        }
    });
    let sentinels = SENTINEL_ROWS.into_iter().map(ReferenceRow::sentinel);

    for row in file_rows.chain(sentinels) {
        if seen.insert(row.code.clone()) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Build the upsert-or-skip insert for one lookup table.
///
/// `columns` names the three target columns; the first is the conflict key.
pub fn insert_sql(schema: &str, table: &str, columns: &[String], rows: &[ReferenceRow]) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let conflict_key = columns.first().map(|c| quote_ident(c)).unwrap_or_default();
    let values = rows
        .iter()
        .map(|row| {
            format!(
                "({}, {}, {})",
                sql_literal(Some(&row.code)),
                sql_literal(row.label.as_deref()),
                sql_literal(row.description.as_deref())
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "INSERT INTO {}.{} ({column_list}) VALUES\n{values}\nON CONFLICT ({conflict_key}) DO NOTHING",
        quote_ident(schema),
        quote_ident(table)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_db::DuckDbCsvSource;

    fn columns() -> Vec<String> {
        vec!["code".into(), "label".into(), "description".into()]
    }

    fn table(dir: &Path, name: &str, content: &str) -> ReferenceTable {
        let path = dir.join(format!("{name}.csv"));
        std::fs::write(&path, content).unwrap();
        ReferenceTable {
            name: name.to_string(),
            path,
        }
    }

    #[test]
    fn test_discover_sorted_csv_only() {
        let dir = tempfile::tempdir().unwrap();
        table(dir.path(), "zeta", "");
        table(dir.path(), "alpha", "");
        std::fs::write(dir.path().join("readme.txt"), "x").unwrap();

        let names: Vec<_> = discover_tables(dir.path())
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_tables(&dir.path().join("absent")),
            Err(MigrateError::Configuration(_))
        ));
    }

    #[test]
    fn test_rows_get_sentinels_and_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(
            dir.path(),
            "materiau",
            "fonte,Fonte,\nother,Autre local,\n,Orphan,no code\nfonte,Again,\n",
        );

        let rows = load_rows(&DuckDbCsvSource::new().unwrap(), &t).unwrap();
        let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(
            codes,
            vec![
                "fonte",
                "other",
                "not_specified",
                "not_applicable",
                "not_validated",
                "undetermined"
            ]
        );
        assert_eq!(rows[1].label.as_deref(), Some("Autre local"));
    }

    #[test]
    fn test_insert_sql_escapes_and_nulls() {
        let rows = vec![ReferenceRow {
            code: "l'eau".into(),
            label: None,
            description: Some("d\"x".into()),
        }];
        let sql = insert_sql("water_valeur", "type", &columns(), &rows);
        assert_eq!(
            sql,
            "INSERT INTO \"water_valeur\".\"type\" (\"code\", \"label\", \"description\") VALUES\n\
             ('l''eau', NULL, 'd\"x')\n\
             ON CONFLICT (\"code\") DO NOTHING"
        );
    }
}
