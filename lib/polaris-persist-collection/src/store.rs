//! `Store` over a PostgreSQL pool.

use std::sync::Arc;

use async_trait::async_trait;
use polaris_persist::{
    CollectionConfig, ModelSchema, PERSIST_DEBUG_ENV, PersistError, QueryHook, QueryHooks,
    QueryLogger, Store, bounded,
};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

use crate::collection::Collection;
use crate::ddl::evolution_sql;

const PING_SQL: &str = "SELECT 1";

const LIST_SQL: &str = "SELECT table_name::text FROM information_schema.tables \
                        WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
                        ORDER BY table_name";

/// Postgres SQLSTATEs raised when a concurrent caller created the same table or column first.
const UNIQUE_VIOLATION: &str = "23505";
const DUPLICATE_TABLE: &str = "42P07";
const DUPLICATE_COLUMN: &str = "42701";

/// True if `e` means another session won a race to create the same object.
///
/// `IF NOT EXISTS` is not atomic in Postgres: two sessions can both pass the
/// check and one then fails on the catalog's unique index.
fn lost_create_race(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| {
            matches!(
                code.as_ref(),
                UNIQUE_VIOLATION | DUPLICATE_TABLE | DUPLICATE_COLUMN
            )
        })
}

/// Collection-backed store. Starts disconnected; call `connect()` before anything else.
#[derive(Debug)]
pub struct CollectionStore {
    config: CollectionConfig,
    pool: Option<PgPool>,
    hooks: QueryHooks,
    logging_enabled: bool,
}

impl CollectionStore {
    pub fn new(config: CollectionConfig) -> Self {
        Self {
            config,
            pool: None,
            hooks: QueryHooks::new(),
            logging_enabled: false,
        }
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    /// The underlying pool, for queries beyond schema management.
    pub fn pool(&self) -> Result<&PgPool, PersistError> {
        self.pool.as_ref().ok_or(PersistError::NotConnected)
    }

    /// Register an observer for every statement this store issues.
    pub fn add_query_hook(&mut self, hook: Arc<dyn QueryHook>) {
        self.hooks.add(hook);
    }

    /// Attach the query logger (verbose, overridable via `PERSIST_DEBUG`).
    pub fn enable_logging(&mut self) -> Result<(), PersistError> {
        if !self.logging_enabled {
            let logger = QueryLogger::new().verbose(true).from_env(PERSIST_DEBUG_ENV);
            self.hooks.add(Arc::new(logger));
            self.logging_enabled = true;
        }
        Ok(())
    }

    /// Issue `SELECT 1` and fail with `ConnectionError` unless it yields exactly 1.
    pub async fn test_connection(&self) -> Result<(), PersistError> {
        let pool = self.pool()?;
        let value: i32 = bounded(self.config.timeout, async {
            self.hooks
                .observe(PING_SQL, sqlx::query_scalar(PING_SQL).fetch_one(pool))
                .await
                .map_err(|e| PersistError::ConnectionError(e.to_string()))
        })
        .await?;

        if value == 1 {
            Ok(())
        } else {
            Err(PersistError::ConnectionError(format!(
                "expected 1 from {}, got {}",
                PING_SQL, value
            )))
        }
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.database)
            .username(&self.config.user)
            .password(&self.config.password)
            .ssl_mode(PgSslMode::Disable)
    }

    /// Run one DDL statement, treating a lost creation race as success.
    async fn run_ddl(&self, pool: &PgPool, sql: &str) -> Result<(), PersistError> {
        bounded(self.config.timeout, async {
            match self
                .hooks
                .observe(sql, sqlx::query(sql).execute(pool))
                .await
            {
                Ok(_) => Ok(()),
                Err(e) if lost_create_race(&e) => {
                    tracing::debug!(sql, "object created concurrently");
                    Ok(())
                }
                Err(e) => Err(PersistError::SchemaError(format!("{}: {}", sql, e))),
            }
        })
        .await
    }
}

#[async_trait]
impl Store for CollectionStore {
    type Collection = Collection;

    #[tracing::instrument(skip(self), fields(host = %self.config.host, database = %self.config.database))]
    async fn connect(&mut self) -> Result<(), PersistError> {
        if self.pool.is_some() {
            tracing::debug!("already connected");
            return Ok(());
        }

        let options = self.connect_options();
        let max_connections = self.config.max_connections.max(1);
        let pool = bounded(self.config.timeout, async {
            PgPoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await
                .map_err(|e| PersistError::ConnectionError(e.to_string()))
        })
        .await?;
        self.pool = Some(pool);

        if self.config.log_queries {
            self.enable_logging()?;
        }

        if let Err(e) = self.test_connection().await {
            if let Some(pool) = self.pool.take() {
                pool.close().await;
            }
            return Err(e);
        }

        tracing::info!("connected");
        Ok(())
    }

    async fn collections(&self) -> Result<Vec<Collection>, PersistError> {
        let pool = self.pool()?;
        let names: Vec<String> = bounded(self.config.timeout, async {
            self.hooks
                .observe(LIST_SQL, sqlx::query_scalar(LIST_SQL).fetch_all(pool))
                .await
                .map_err(|e| PersistError::ConnectionError(e.to_string()))
        })
        .await?;

        Ok(names
            .into_iter()
            .map(|name| Collection::new(name, pool.clone()))
            .collect())
    }

    #[tracing::instrument(skip(self, model), fields(model = model.type_name))]
    async fn collection(
        &self,
        name: &str,
        model: &ModelSchema,
    ) -> Result<Collection, PersistError> {
        let statements = evolution_sql(name, model)?;
        let pool = self.pool()?;

        // Not wrapped in a transaction: readers may observe a partly evolved table.
        for sql in &statements {
            self.run_ddl(pool, sql).await?;
        }

        tracing::debug!(collection = name, "collection ready");
        Ok(Collection::new(name, pool.clone()))
    }
}
