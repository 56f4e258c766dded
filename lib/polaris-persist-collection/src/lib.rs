//! PostgreSQL collection implementation of `Store`.
//!
//! `CollectionStore` treats tables as schema-evolving collections: asking for
//! a collection creates its table with an `id` key if needed and then adds a
//! column for every tagged model field that is missing. Columns are never
//! removed or retyped.
//!
//! Connections are opened with `sslmode=disable`.
//!
//! # Example
//!
//! ```text
//! use polaris_persist::{CollectionConfig, Model, Store};
//! use polaris_persist_collection::CollectionStore;
//!
//! #[derive(Model)]
//! pub struct Profile {
//!     #[column]
//!     pub email: String,
//!     #[column(kind = "json")]
//!     pub settings: Settings,
//! }
//!
//! let mut store = CollectionStore::new(CollectionConfig::new("localhost", 5432, "app", "app", "secret"));
//! store.connect().await?;
//! let profiles = store.collection("profiles", Profile::schema()).await?;
//! let tenant = store.new_bucket("acme")?;
//! let scoped = tenant.collection("profiles", Profile::schema()).await?;   // "acme_profiles"
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod collection;
mod ddl;
mod store;

pub use collection::{Collection, ColumnInfo};
pub use ddl::{ID_COLUMN, add_column_sql, create_collection_sql, evolution_sql};
pub use store::CollectionStore;

// Re-export core types for convenience
pub use polaris_persist::{
    Bucket, CollectionConfig, ColumnType, FieldKind, FieldSchema, Model, ModelSchema,
    PersistError, QueryEvent, QueryHook, QueryLogger, Store,
};
