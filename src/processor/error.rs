//! Error types for the processor module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for processor operations
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Chunk options that cannot produce a forward-moving window
    #[error("Invalid chunk options: {0}")]
    InvalidOptions(String),
}

impl From<ProcessError> for CrateError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::InvalidOptions(msg) => CrateError::InvalidInput(msg),
        }
    }
}
