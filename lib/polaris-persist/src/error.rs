use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Not connected: call connect() first")]
    NotConnected,

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Unsupported type: field `{field}` has type `{rust_type}` with no column mapping")]
    UnsupportedType { field: String, rust_type: String },

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl PersistError {
    /// True for failures that mean the store cannot reach its database.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            PersistError::ConnectionError(_) | PersistError::NotConnected
        )
    }
}
