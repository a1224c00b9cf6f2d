//! SQL quoting utilities
//!
//! Used when building statements around user-supplied table names and
//! reference-data values.

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and doubles any embedded double
/// quotes.
///
/// # Examples
/// ```
/// use strata_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `schema.table`).
///
/// # Examples
/// ```
/// use strata_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("staging.orders"), r#""staging"."orders""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Escape a SQL string literal value by doubling single quotes.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render an optional text value as a SQL literal, `NULL` when absent.
///
/// # Examples
/// ```
/// use strata_core::sql_utils::sql_literal;
/// assert_eq!(sql_literal(Some("l'eau")), "'l''eau'");
/// assert_eq!(sql_literal(None), "NULL");
/// ```
pub fn sql_literal(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("'{}'", escape_sql_string(v)),
        None => "NULL".to_string(),
    }
}
