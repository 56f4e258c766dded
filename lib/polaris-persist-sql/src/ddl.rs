//! DDL generation for model tables.

use polaris_persist::{ColumnDefinition, quote_identifier};

/// Build `CREATE TABLE IF NOT EXISTS` SQL for a table with the given columns.
///
/// The statement is valid for both SQLite and PostgreSQL.
pub fn create_table_sql(table: &str, columns: &[ColumnDefinition]) -> String {
    let cols: Vec<String> = columns.iter().map(ColumnDefinition::to_sql).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(table),
        cols.join(", ")
    )
}
