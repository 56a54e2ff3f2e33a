//! Error types for the sitechat crate

use serde::Serialize;
use thiserror::Error;

/// Result type for sitechat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an error, used to decide how it is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied something unusable (bad seed URL, unknown collection)
    Input,
    /// A page could not be fetched; normally recovered inside the crawl
    Fetch,
    /// A read or write against one of the backing stores failed
    Store,
    /// The text-generation service failed
    Generation,
    /// Anything else
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Input => "input",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Store => "store",
            ErrorKind::Generation => "generation",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Error type for sitechat operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A collection name that no store or registry knows about
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Text generation error
    #[error("Generation error: {0}")]
    Generation(String),

    /// Background task failure
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) | Error::CollectionNotFound(_) => ErrorKind::Input,
            Error::Http(_) | Error::Crawl(_) => ErrorKind::Fetch,
            Error::Database(_) => ErrorKind::Store,
            Error::Generation(_) => ErrorKind::Generation,
            Error::Task(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller is at fault
    pub fn is_input(&self) -> bool {
        self.kind() == ErrorKind::Input
    }
}

/// A user-facing error payload: a message plus its classification
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
