use thiserror::Error;

use crate::error::Error as CrateError;
use crate::index::DbError;

/// Errors that can occur while answering a query
#[derive(Debug, Error)]
pub enum SearchError {
    /// Error occurred during database operations
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The text-generation service failed or returned something unusable
    #[error("Generation error: {0}")]
    Generation(String),

    /// Invalid query parameters
    #[error("Invalid query parameters: {0}")]
    InvalidParameters(String),
}

impl From<rig::completion::CompletionError> for SearchError {
    fn from(err: rig::completion::CompletionError) -> Self {
        SearchError::Generation(err.to_string())
    }
}

impl From<SearchError> for CrateError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Database(db) => db.into(),
            SearchError::Generation(message) => CrateError::Generation(message),
            SearchError::InvalidParameters(message) => CrateError::InvalidInput(message),
        }
    }
}
