//! Database Error Types
//!
//! Error types for the persistence layer: connection, initialization,
//! SQL execution, and row decoding failures. Business-rule errors live in
//! the service-layer error type.

use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A fetched row could not be decoded into a model
    #[error("Row decoding failed: {context}")]
    RowDecodeFailed { context: String },
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an initialization failed error
    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Create a row decoding error with context
    pub fn row_decode(context: impl Into<String>) -> Self {
        Self::RowDecodeFailed {
            context: context.into(),
        }
    }

    /// Whether this error is a lock/busy conflict rather than a hard failure
    ///
    /// SQLite reports a writer that lost the race as SQLITE_BUSY or a
    /// "database is locked" condition once the busy timeout expires; libsql
    /// surfaces both through its error text. Callers map these to a
    /// conflict error kind instead of a storage failure.
    pub fn is_busy(&self) -> bool {
        let text = match self {
            DatabaseError::LibsqlError(e) => e.to_string(),
            DatabaseError::SqlExecutionError { context } => context.clone(),
            _ => return false,
        };
        let text = text.to_ascii_lowercase();
        text.contains("database is locked")
            || text.contains("database table is locked")
            || text.contains("sqlite_busy")
    }
}
