//! Error types for the crawler module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("HTTP status {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// Response was not an HTML document
    #[error("Skipping non-HTML content at {url} ({content_type})")]
    NotHtml {
        /// Requested URL
        url: String,
        /// Content-Type header as received
        content_type: String,
    },

    /// HTML parsing error
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// The seed URL failed validation
    #[error("Invalid URL: {0}")]
    InvalidSeed(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl CrawlError {
    /// Whether the crawl can skip the URL and carry on
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CrawlError::Http(_) | CrawlError::Status { .. } | CrawlError::NotHtml { .. }
        )
    }
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Http(e) => CrateError::Http(e),
            CrawlError::InvalidSeed(url) => CrateError::InvalidInput(format!("Invalid URL: {}", url)),
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}
