//! SQLite and PostgreSQL implementation of `Persist`.
//!
//! `SqlStore` opens a pool for the configured target and creates tables from
//! model schemas. It owns no query logic beyond that: once a table exists,
//! use [`SqlStore::pool`] and sqlx directly.
//!
//! # Usage
//!
//! ```text
//! use polaris_persist::{Model, Persist, SqlConfig};
//! use polaris_persist_sql::SqlStore;
//!
//! #[derive(Model)]
//! pub struct User {
//!     #[column(primary_key)]
//!     pub id: String,
//!     #[column]
//!     pub name: String,
//! }
//!
//! let mut store = SqlStore::new(SqlConfig::in_memory());
//! store.connect().await?;
//! store.migrate_using(&[User::schema()]).await?;   // creates table "user"
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod ddl;
mod pool;
mod store;

pub use ddl::create_table_sql;
pub use pool::{Dialect, SqlPool};
pub use store::SqlStore;

// Re-export core types for convenience
pub use polaris_persist::{
    ColumnType, FieldKind, FieldSchema, Model, ModelSchema, Persist, PersistError, QueryEvent,
    QueryHook, QueryLogger, SqlConfig, SqlTarget, derive_name,
};
