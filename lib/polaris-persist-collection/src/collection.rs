//! Collection handles.

use polaris_persist::PersistError;
use sqlx::PgPool;

/// A column as reported by `information_schema`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Postgres type name, e.g. `character varying`, `integer`, `jsonb`.
    pub data_type: String,
}

/// Handle to a collection table.
///
/// Reads and writes go through [`Collection::pool`] and sqlx; the handle only
/// knows the table's name and how to describe it.
#[derive(Clone, Debug)]
pub struct Collection {
    name: String,
    pool: PgPool,
}

impl Collection {
    pub(crate) fn new(name: impl Into<String>, pool: PgPool) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Whether the backing table still exists.
    pub async fn exists(&self) -> Result<bool, PersistError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1",
        )
        .bind(&self.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PersistError::ConnectionError(e.to_string()))?;
        Ok(count > 0)
    }

    /// Columns of the backing table in declaration order.
    pub async fn columns(&self) -> Result<Vec<ColumnInfo>, PersistError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(&self.name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PersistError::ConnectionError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type)| ColumnInfo { name, data_type })
            .collect())
    }
}
