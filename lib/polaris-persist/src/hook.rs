//! Query observation hooks.
//!
//! Adapters run every statement through [`QueryHooks::observe`], which times the
//! call and hands a [`QueryEvent`] to each registered hook afterwards. Hooks see
//! the statement and its outcome but cannot change either.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Environment variable that overrides the query logger's level:
/// `0` off, `1` failed queries only, `2` every query.
pub const PERSIST_DEBUG_ENV: &str = "PERSIST_DEBUG";

const QUERY_TARGET: &str = "polaris_persist::query";

/// A statement that has finished executing.
#[derive(Debug, Clone, Copy)]
pub struct QueryEvent<'a> {
    pub sql: &'a str,
    pub elapsed: Duration,
    /// Driver error message when the statement failed.
    pub error: Option<&'a str>,
}

/// Observer notified after each statement an adapter issues.
pub trait QueryHook: Send + Sync + fmt::Debug {
    fn after_query(&self, event: &QueryEvent<'_>);
}

/// The hooks attached to one store.
#[derive(Debug, Clone, Default)]
pub struct QueryHooks {
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl QueryHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hook: Arc<dyn QueryHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Await `fut`, then report `sql` and the outcome to every hook.
    pub async fn observe<T, E, F>(&self, sql: &str, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        if self.hooks.is_empty() {
            return fut.await;
        }

        let started = Instant::now();
        let result = fut.await;
        let error = result.as_ref().err().map(|e| e.to_string());
        let event = QueryEvent {
            sql,
            elapsed: started.elapsed(),
            error: error.as_deref(),
        };
        for hook in &self.hooks {
            hook.after_query(&event);
        }
        result
    }
}

/// How much the query logger reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryLogLevel {
    Off,
    Failed,
    All,
}

impl QueryLogLevel {
    /// Parse a `PERSIST_DEBUG` value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "0" => Some(QueryLogLevel::Off),
            "1" => Some(QueryLogLevel::Failed),
            "2" => Some(QueryLogLevel::All),
            _ => None,
        }
    }
}

/// Hook that writes statements to `tracing` under the `polaris_persist::query` target.
///
/// Failed statements are logged at `warn`, successful ones at `debug` when verbose.
#[derive(Debug, Clone)]
pub struct QueryLogger {
    level: QueryLogLevel,
}

impl QueryLogger {
    /// Logs failed statements only.
    pub fn new() -> Self {
        Self {
            level: QueryLogLevel::Failed,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.level = if verbose {
            QueryLogLevel::All
        } else {
            QueryLogLevel::Failed
        };
        self
    }

    /// Let the environment variable `key` override the level, if it is set to a known value.
    pub fn from_env(mut self, key: &str) -> Self {
        if let Some(level) = std::env::var(key).ok().and_then(|v| QueryLogLevel::parse(&v)) {
            self.level = level;
        }
        self
    }

    pub fn level(&self) -> QueryLogLevel {
        self.level
    }
}

impl Default for QueryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryHook for QueryLogger {
    fn after_query(&self, event: &QueryEvent<'_>) {
        let elapsed_ms = event.elapsed.as_secs_f64() * 1000.0;
        match (self.level, event.error) {
            (QueryLogLevel::Off, _) | (QueryLogLevel::Failed, None) => {}
            (_, Some(error)) => {
                tracing::warn!(target: QUERY_TARGET, sql = event.sql, elapsed_ms, error, "query failed");
            }
            (QueryLogLevel::All, None) => {
                tracing::debug!(target: QUERY_TARGET, sql = event.sql, elapsed_ms, "query");
            }
        }
    }
}
