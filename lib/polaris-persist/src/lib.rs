//! Polaris Persist - Core traits for thin persistence adapters.
//!
//! This crate defines the contracts shared by the SQL and collection backends
//! and the small amount of logic they have in common.
//!
//! # Core Concepts
//!
//! - **Model**: a record type described by a static [`ModelSchema`]. The schema
//!   lists the tagged fields and their semantic kind; values are never inspected.
//! - **Store**: the top-level handle owning a database connection pool.
//! - **Bucket**: a namespaced view over a store that prefixes collection names.
//! - **Migration**: ensuring a table exists (and, for collections, evolving its
//!   columns) to match a model's shape.
//!
//! # Traits
//!
//! - [`Persist`]: SQL-style migrations driven by model schemas
//! - [`Store`]: Collection-style access with additive schema evolution
//! - [`Model`]: Types with a static schema descriptor (derive with `#[derive(Model)]`)
//! - [`QueryHook`]: Observers notified after every statement an adapter issues

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

// Lets the derive macro's `polaris_persist::` paths resolve inside this crate's own tests.
extern crate self as polaris_persist;

mod config;
mod error;
mod hook;
mod naming;
mod persist;
mod schema;
mod store;
mod timeout;

pub use config::{CollectionConfig, SqlConfig, SqlTarget};
pub use error::PersistError;
pub use hook::{PERSIST_DEBUG_ENV, QueryEvent, QueryHook, QueryHooks, QueryLogLevel, QueryLogger};
pub use naming::{derive_name, namespaced, quote_identifier, validate_identifier};
pub use persist::Persist;
pub use schema::{ColumnDefinition, ColumnType, FieldKind, FieldSchema, Model, ModelSchema};
pub use store::{Bucket, Store};
pub use timeout::bounded;

// Re-export derive macro
pub use polaris_persist_derive::Model;
