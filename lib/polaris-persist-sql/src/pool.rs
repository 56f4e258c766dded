//! Connection pools for the SQL adapter.

use std::str::FromStr;

use polaris_persist::{PersistError, SqlTarget};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Round-trip query used to verify a connection.
pub(crate) const PING_SQL: &str = "SELECT 1";

/// SQL dialect behind a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Pick the dialect for a database URL by its scheme.
    pub fn for_url(url: &str) -> Result<Self, PersistError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Dialect::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Dialect::Sqlite)
        } else {
            // Only the scheme is reported; the rest may carry credentials.
            let scheme = url.split(':').next().unwrap_or_default();
            Err(PersistError::ConnectionError(format!(
                "unsupported database URL scheme: {:?}",
                scheme
            )))
        }
    }
}

/// A sqlx pool for one of the supported dialects.
#[derive(Clone, Debug)]
pub enum SqlPool {
    Sqlite(sqlx::SqlitePool),
    Postgres(sqlx::PgPool),
}

fn connection_error(e: sqlx::Error) -> PersistError {
    PersistError::ConnectionError(e.to_string())
}

const MEMORY_URL: &str = "sqlite::memory:";

/// Whether a `sqlite:` URL names an in-memory database.
fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// One connection that is never recycled; an in-memory database lives only as
/// long as its connection.
async fn memory_pool(url: &str) -> Result<SqlPool, PersistError> {
    let options = SqliteConnectOptions::from_str(url).map_err(connection_error)?;
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(connection_error)?;
    Ok(SqlPool::Sqlite(pool))
}

impl SqlPool {
    /// Open a pool for `target`.
    ///
    /// In-memory targets, including in-memory `sqlite:` URLs, get exactly one
    /// connection regardless of `max_connections`.
    pub async fn connect(target: &SqlTarget, max_connections: u32) -> Result<Self, PersistError> {
        match target {
            SqlTarget::InMemory => memory_pool(MEMORY_URL).await,
            SqlTarget::Dsn(url) => match Dialect::for_url(url)? {
                Dialect::Postgres => {
                    let pool = PgPoolOptions::new()
                        .max_connections(max_connections.max(1))
                        .connect(url)
                        .await
                        .map_err(connection_error)?;
                    Ok(SqlPool::Postgres(pool))
                }
                Dialect::Sqlite if is_memory_url(url) => memory_pool(url).await,
                Dialect::Sqlite => {
                    let pool = SqlitePoolOptions::new()
                        .max_connections(max_connections.max(1))
                        .connect(url)
                        .await
                        .map_err(connection_error)?;
                    Ok(SqlPool::Sqlite(pool))
                }
            },
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            SqlPool::Sqlite(_) => Dialect::Sqlite,
            SqlPool::Postgres(_) => Dialect::Postgres,
        }
    }

    pub fn as_sqlite(&self) -> Option<&sqlx::SqlitePool> {
        match self {
            SqlPool::Sqlite(pool) => Some(pool),
            SqlPool::Postgres(_) => None,
        }
    }

    pub fn as_postgres(&self) -> Option<&sqlx::PgPool> {
        match self {
            SqlPool::Postgres(pool) => Some(pool),
            SqlPool::Sqlite(_) => None,
        }
    }

    /// Execute a statement and return the number of rows affected.
    pub async fn execute(&self, sql: &str) -> Result<u64, sqlx::Error> {
        let result = match self {
            SqlPool::Sqlite(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
            SqlPool::Postgres(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
        };
        Ok(result)
    }

    /// Run `SELECT 1` and return the value it produced.
    pub async fn ping(&self) -> Result<i64, sqlx::Error> {
        match self {
            SqlPool::Sqlite(pool) => {
                let value: i64 = sqlx::query_scalar(PING_SQL).fetch_one(pool).await?;
                Ok(value)
            }
            SqlPool::Postgres(pool) => {
                // Postgres types the literal as int4.
                let value: i32 = sqlx::query_scalar(PING_SQL).fetch_one(pool).await?;
                Ok(i64::from(value))
            }
        }
    }

    /// Whether `table` exists in the current schema.
    pub async fn table_exists(&self, table: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = match self {
            SqlPool::Sqlite(pool) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                )
                .bind(table)
                .fetch_one(pool)
                .await?
            }
            SqlPool::Postgres(pool) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM information_schema.tables \
                     WHERE table_schema = current_schema() AND table_name = $1",
                )
                .bind(table)
                .fetch_one(pool)
                .await?
            }
        };
        Ok(count > 0)
    }

    /// Column names of `table` in declaration order. Empty if the table does not exist.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>, sqlx::Error> {
        match self {
            SqlPool::Sqlite(pool) => {
                sqlx::query_scalar("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
                    .bind(table)
                    .fetch_all(pool)
                    .await
            }
            SqlPool::Postgres(pool) => {
                sqlx::query_scalar(
                    "SELECT column_name::text FROM information_schema.columns \
                     WHERE table_schema = current_schema() AND table_name = $1 \
                     ORDER BY ordinal_position",
                )
                .bind(table)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Names of all user tables, sorted.
    pub async fn tables(&self) -> Result<Vec<String>, sqlx::Error> {
        match self {
            SqlPool::Sqlite(pool) => {
                sqlx::query_scalar(
                    "SELECT name FROM sqlite_master \
                     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )
                .fetch_all(pool)
                .await
            }
            SqlPool::Postgres(pool) => {
                sqlx::query_scalar(
                    "SELECT table_name::text FROM information_schema.tables \
                     WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
                     ORDER BY table_name",
                )
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Close every connection in the pool.
    pub async fn close(&self) {
        match self {
            SqlPool::Sqlite(pool) => pool.close().await,
            SqlPool::Postgres(pool) => pool.close().await,
        }
    }
}
