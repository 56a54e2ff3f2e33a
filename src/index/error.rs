//! # Database Error Types Module
//!
//! Error types for the storage layer: the text store, the metadata store and
//! the collection registry all report through `DbError`.

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// LibSQL error
    #[error("LibSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// SQL query error
    #[error("SQL query error: {0}")]
    Query(String),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Data error
    #[error("Data error: {0}")]
    Data(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The collection does not exist in this store
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Data(format!("Invalid JSON column: {}", err))
    }
}

impl From<DbError> for CrateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::CollectionNotFound(name) => CrateError::CollectionNotFound(name),
            _ => CrateError::Database(err.to_string()),
        }
    }
}
