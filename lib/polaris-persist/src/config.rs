//! Connection configuration for the two backends.
//!
//! Every field is spelled out; there is no global default connection string.
//! Both structs deserialize with serde so they can be loaded from whatever
//! configuration source the application already uses.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Where the SQL adapter connects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlTarget {
    /// A private in-memory SQLite database that lives as long as the store.
    InMemory,
    /// A database URL: `postgres://`, `postgresql://` or `sqlite:`.
    Dsn(String),
}

impl From<&str> for SqlTarget {
    fn from(url: &str) -> Self {
        SqlTarget::Dsn(url.to_string())
    }
}

impl From<String> for SqlTarget {
    fn from(url: String) -> Self {
        SqlTarget::Dsn(url)
    }
}

impl From<&String> for SqlTarget {
    fn from(url: &String) -> Self {
        SqlTarget::Dsn(url.clone())
    }
}

/// Configuration for the SQL adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqlConfig {
    pub target: SqlTarget,
    /// Upper bound on pooled connections. In-memory targets always use one.
    pub max_connections: u32,
    /// Applied to every network-facing call. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Attach the query logger during `connect()`.
    pub log_queries: bool,
}

impl SqlConfig {
    pub fn in_memory() -> Self {
        Self {
            target: SqlTarget::InMemory,
            max_connections: 1,
            timeout: None,
            log_queries: false,
        }
    }

    pub fn dsn(target: impl Into<SqlTarget>, max_connections: u32) -> Self {
        Self {
            target: target.into(),
            max_connections,
            timeout: None,
            log_queries: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_query_logging(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }
}

/// Configuration for the collection adapter.
///
/// TLS is disabled for these connections (`sslmode=disable`). Only use this
/// adapter on trusted networks.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub timeout: Option<Duration>,
    pub log_queries: bool,
}

impl CollectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: password.into(),
            max_connections: 4,
            timeout: None,
            log_queries: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_query_logging(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }
}

impl fmt::Debug for CollectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("timeout", &self.timeout)
            .field("log_queries", &self.log_queries)
            .finish()
    }
}
