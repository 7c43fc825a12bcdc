//! Error types for schema introspection.

use std::time::Duration;

/// Errors that can occur while reading table metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// Database error while querying the catalog.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading metadata took longer than the configured timeout.
    #[error("Reading metadata for table '{table}' timed out after {timeout:?}")]
    Timeout {
        /// The table being read.
        table: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The table or view does not exist.
    #[error("Table not found: {0}")]
    TableNotFound(String),
}

/// Result type for introspection operations.
pub type Result<T> = std::result::Result<T, MetaError>;
