//! `Persist` over a sqlx SQLite or PostgreSQL pool.

use std::sync::Arc;

use async_trait::async_trait;
use polaris_persist::{
    ModelSchema, PERSIST_DEBUG_ENV, Persist, PersistError, QueryHook, QueryHooks, QueryLogger,
    SqlConfig, bounded, validate_identifier,
};

use crate::create_table_sql;
use crate::pool::{PING_SQL, SqlPool};

/// SQL-backed store. Starts disconnected; call `connect()` before anything else.
#[derive(Debug)]
pub struct SqlStore {
    config: SqlConfig,
    pool: Option<SqlPool>,
    hooks: QueryHooks,
    logging_enabled: bool,
}

impl SqlStore {
    pub fn new(config: SqlConfig) -> Self {
        Self {
            config,
            pool: None,
            hooks: QueryHooks::new(),
            logging_enabled: false,
        }
    }

    pub fn config(&self) -> &SqlConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    /// The underlying pool, for queries beyond table creation.
    pub fn pool(&self) -> Result<&SqlPool, PersistError> {
        self.pool.as_ref().ok_or(PersistError::NotConnected)
    }

    /// Register an observer for every statement this store issues.
    pub fn add_query_hook(&mut self, hook: Arc<dyn QueryHook>) {
        self.hooks.add(hook);
    }
}

/// Accept a `SELECT 1` result only if it is exactly 1.
fn check_round_trip(value: i64) -> Result<(), PersistError> {
    if value == 1 {
        Ok(())
    } else {
        Err(PersistError::ConnectionError(format!(
            "expected 1 from {}, got {}",
            PING_SQL, value
        )))
    }
}

#[async_trait]
impl Persist for SqlStore {
    #[tracing::instrument(skip(self))]
    async fn connect(&mut self) -> Result<(), PersistError> {
        if self.pool.is_some() {
            tracing::debug!("already connected");
            return Ok(());
        }

        let pool = bounded(
            self.config.timeout,
            SqlPool::connect(&self.config.target, self.config.max_connections),
        )
        .await?;
        let dialect = pool.dialect();
        self.pool = Some(pool);

        if self.config.log_queries {
            self.enable_logging().await?;
        }

        if let Err(e) = self.test_connection().await {
            if let Some(pool) = self.pool.take() {
                pool.close().await;
            }
            return Err(e);
        }

        tracing::info!(?dialect, "connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), PersistError> {
        // The pool is process-lifetime; it closes when the store is dropped.
        tracing::debug!("disconnect requested, keeping pool open");
        Ok(())
    }

    async fn enable_logging(&mut self) -> Result<(), PersistError> {
        if !self.logging_enabled {
            let logger = QueryLogger::new().verbose(true).from_env(PERSIST_DEBUG_ENV);
            self.hooks.add(Arc::new(logger));
            self.logging_enabled = true;
        }
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), PersistError> {
        let pool = self.pool()?;
        let value = bounded(self.config.timeout, async {
            self.hooks
                .observe(PING_SQL, pool.ping())
                .await
                .map_err(|e| PersistError::ConnectionError(e.to_string()))
        })
        .await?;
        check_round_trip(value)
    }

    #[tracing::instrument(skip(self, model), fields(model = model.type_name))]
    async fn migrate(&self, namespace: &str, model: &ModelSchema) -> Result<String, PersistError> {
        let pool = self.pool()?;
        let table = model.table_name(namespace);
        validate_identifier(&table)?;

        let columns = model.column_definitions()?;
        if columns.is_empty() {
            return Err(PersistError::SchemaError(format!(
                "model {} has no persisted columns",
                model.type_name
            )));
        }

        let sql = create_table_sql(&table, &columns);
        bounded(self.config.timeout, async {
            self.hooks
                .observe(&sql, pool.execute(&sql))
                .await
                .map_err(|e| PersistError::SchemaError(format!("create table {}: {}", table, e)))
        })
        .await?;

        tracing::debug!(table = %table, columns = columns.len(), "table ready");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_accepts_only_one() {
        assert!(check_round_trip(1).is_ok());
        for value in [0, 2, -1, i64::MAX] {
            let err = check_round_trip(value).unwrap_err();
            assert!(matches!(err, PersistError::ConnectionError(_)));
        }
    }

    #[tokio::test]
    async fn test_operations_before_connect_fail() {
        let store = SqlStore::new(SqlConfig::in_memory());
        assert!(!store.is_connected());
        assert!(matches!(
            store.test_connection().await,
            Err(PersistError::NotConnected)
        ));
        assert!(matches!(store.pool(), Err(PersistError::NotConnected)));
    }

    #[tokio::test]
    async fn test_enable_logging_attaches_one_logger() {
        let mut store = SqlStore::new(SqlConfig::in_memory());
        store.enable_logging().await.unwrap();
        store.enable_logging().await.unwrap();
        assert_eq!(store.hooks.len(), 1);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let mut store = SqlStore::new(SqlConfig::in_memory().with_query_logging(true));
        store.connect().await.unwrap();
        store.connect().await.unwrap();
        assert!(store.is_connected());
        assert_eq!(store.hooks.len(), 1);
    }
}
