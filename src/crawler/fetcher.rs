//! Single-page HTTP fetching for the crawler

use reqwest::Client as ReqwestClient;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, instrument};

use crate::crawler::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// Raw HTML of a page that passed status and content-type checks
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,

    /// Response body
    pub html: String,
}

/// Issues one GET per URL with a browser-like header set
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: ReqwestClient,
}

impl Fetcher {
    /// Build a fetcher from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);

        let client = ReqwestClient::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch `url`, failing on network errors, non-2xx statuses and non-HTML bodies
    ///
    /// There are no retries; the caller decides what a failure means.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.to_lowercase().contains("text/html") {
            return Err(CrawlError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }

        let html = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, html.len());

        Ok(FetchedPage {
            url: url.to_string(),
            html,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, CrawlError> {
    HeaderValue::from_str(value)
        .map_err(|e| CrawlError::Other(format!("Invalid header value '{}': {}", value, e)))
}
