//! The SQL-style persistence contract.

use async_trait::async_trait;

use crate::{ModelSchema, PersistError};

/// Trait for stores that create tables from model schemas.
///
/// Stores start disconnected. `connect()` is the only way into the connected
/// state and there is no way back: the pool lives as long as the store.
/// Every other operation fails with `PersistError::NotConnected` before then.
///
/// Failures are returned to the caller as they happen; nothing is retried.
#[async_trait]
pub trait Persist: Send + Sync {
    /// Open the connection pool and verify it with a round trip.
    async fn connect(&mut self) -> Result<(), PersistError>;

    /// Release the store's hold on the database.
    ///
    /// The connection is process-lifetime, so implementations may treat this as a no-op.
    async fn disconnect(&mut self) -> Result<(), PersistError>;

    /// Attach a query-logging hook. Logging never changes what is executed.
    async fn enable_logging(&mut self) -> Result<(), PersistError>;

    /// Issue `SELECT 1` and fail with `ConnectionError` unless it yields exactly 1.
    async fn test_connection(&self) -> Result<(), PersistError>;

    /// Migrate every model without a namespace.
    async fn migrate_using(&self, models: &[&ModelSchema]) -> Result<(), PersistError> {
        self.migrate_using_with_namespace("", models).await
    }

    /// Migrate every model under `namespace`, in order.
    ///
    /// Stops at the first failure; later models are not attempted.
    async fn migrate_using_with_namespace(
        &self,
        namespace: &str,
        models: &[&ModelSchema],
    ) -> Result<(), PersistError> {
        for model in models {
            self.migrate(namespace, model).await?;
        }
        Ok(())
    }

    /// Create the table for `model` if it does not exist and return its name.
    ///
    /// The name is `derive_name(model.type_name, namespace)`. Calling this
    /// again for the same model is a no-op.
    async fn migrate(&self, namespace: &str, model: &ModelSchema) -> Result<String, PersistError>;
}
