//! DDL for collection tables.

use polaris_persist::{
    ColumnDefinition, ColumnType, ModelSchema, PersistError, quote_identifier, validate_identifier,
};

/// Every collection table has this primary key column.
pub const ID_COLUMN: &str = "id";

/// `CREATE TABLE IF NOT EXISTS` with only the `id` key column.
pub fn create_collection_sql(name: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} varchar(255) NOT NULL, PRIMARY KEY ({}))",
        quote_identifier(name),
        ID_COLUMN,
        ID_COLUMN
    )
}

/// `ALTER TABLE ... ADD COLUMN IF NOT EXISTS` for one column.
///
/// Key flags are ignored: a collection's only key is `id`.
pub fn add_column_sql(name: &str, column: &ColumnDefinition) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
        quote_identifier(name),
        quote_identifier(column.name),
        column.column_type.sql()
    )
}

/// Statements that bring collection `name` up to `model`, in execution order.
///
/// The first statement creates the table; one `ADD COLUMN` follows for every
/// mappable field other than `id`. A tagged `id` always stays `varchar(255)`.
pub fn evolution_sql(name: &str, model: &ModelSchema) -> Result<Vec<String>, PersistError> {
    validate_identifier(name)?;
    let columns = model.column_definitions()?;

    let mut statements = Vec::with_capacity(columns.len() + 1);
    statements.push(create_collection_sql(name));
    for column in &columns {
        if column.name == ID_COLUMN {
            if column.column_type != ColumnType::Varchar {
                tracing::warn!(
                    collection = name,
                    model = model.type_name,
                    declared = column.column_type.sql(),
                    "id column is always varchar(255); ignoring declared type"
                );
            }
            continue;
        }
        statements.push(add_column_sql(name, column));
    }
    Ok(statements)
}
