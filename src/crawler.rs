//! # Website Crawler Module
//!
//! This module gathers the raw material for the index: it walks a single site
//! breadth-first, fetches each page once, and turns the HTML into a
//! [`PageDocument`] carrying clean text, image references and structured
//! metadata.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: depth, page and timeout limits plus the request headers
//! - `Fetcher`: one GET per URL, rejecting non-2xx and non-HTML responses
//! - `content_extraction`: text, links, images and metadata from parsed HTML
//! - `Crawler`: the bounded breadth-first traversal over same-origin links
//!
//! ## Crawl rules
//!
//! - Only links with the seed's scheme, host and port are followed
//! - URLs are normalized (no fragment, no trailing slash) before deduplication
//! - A failed fetch skips the URL; it never aborts the crawl
//! - Every crawl owns its own queue, visited-set and page counter, so
//!   concurrent crawls never share state

mod config;
mod content_extraction;
mod controller;
mod error;
mod fetcher;
pub mod urls;

pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use content_extraction::{
    ExtractedPage, extract_images, extract_links, extract_metadata, extract_page, extract_text,
};
pub use controller::{Crawler, crawl_website};
pub use error::CrawlError;
pub use fetcher::{FetchedPage, Fetcher};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A successfully fetched and extracted page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    /// Normalized URL of the page
    pub url: String,

    /// Visible text with whitespace collapsed
    pub content: String,

    /// Images in document order
    pub images: Vec<ImageRef>,

    /// Metadata extracted from the page
    pub metadata: PageMetadata,
}

/// An `<img>` reference found on a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute image URL
    pub src: String,

    /// Alt text, verbatim
    #[serde(default)]
    pub alt: String,

    /// Raw width attribute, possibly empty
    #[serde(default)]
    pub width: String,

    /// Raw height attribute, possibly empty
    #[serde(default)]
    pub height: String,

    /// Title attribute, verbatim
    #[serde(default)]
    pub title: String,
}

/// Metadata for a crawled page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Text of the `<title>` tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Content of `<meta name="description">`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `h1_headings` .. `h6_headings`, each a comma-joined list of that level's headings
    #[serde(flatten)]
    pub headings: BTreeMap<String, String>,

    /// Crawl depth the page was found at
    pub depth: u32,

    /// Length of the raw HTML in characters
    pub html_length: usize,

    /// Number of images kept on the page
    pub image_count: usize,
}

impl PageMetadata {
    /// Key under which the headings of `level` (1-6) are stored
    pub fn heading_key(level: u8) -> String {
        format!("h{}_headings", level)
    }

    /// Comma-joined heading texts for `level`, if the page had any
    pub fn headings(&self, level: u8) -> Option<&str> {
        self.headings
            .get(&Self::heading_key(level))
            .map(String::as_str)
    }
}

impl PageDocument {
    /// Title of the page, or an empty string
    pub fn title(&self) -> &str {
        self.metadata.title.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_metadata_serializes_flat_headings() {
        let mut metadata = PageMetadata {
            title: Some("Test Page".to_string()),
            description: None,
            depth: 1,
            html_length: 420,
            image_count: 0,
            ..Default::default()
        };
        metadata
            .headings
            .insert(PageMetadata::heading_key(2), "Pricing, FAQ".to_string());

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["title"], "Test Page");
        assert_eq!(value["h2_headings"], "Pricing, FAQ");
        assert_eq!(value["depth"], 1);
        assert!(value.get("description").is_none());

        let back: PageMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back.headings(2), Some("Pricing, FAQ"));
        assert_eq!(back.headings(1), None);
    }
}
