//! Bounded breadth-first crawl over a single origin

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, instrument, warn};
use url::{Origin, Url};

use crate::crawler::content_extraction::extract_page;
use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::urls::{normalize_url, parse_valid_url};
use crate::crawler::{CrawlerConfig, PageDocument};

/// State owned by exactly one crawl invocation
struct CrawlContext {
    origin: Origin,
    queue: VecDeque<(String, u32)>,
    visited: HashSet<String>,
    pages_scraped: u32,
}

impl CrawlContext {
    fn new(seed: &Url) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back((normalize_url(seed), 0));
        Self {
            origin: seed.origin(),
            queue,
            visited: HashSet::new(),
            pages_scraped: 0,
        }
    }
}

/// Crawls one site breadth-first, bounded by depth and page count
#[derive(Debug, Clone)]
pub struct Crawler {
    config: CrawlerConfig,
    fetcher: Fetcher,
}

impl Crawler {
    /// Create a crawler with its own HTTP client
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Self { config, fetcher })
    }

    /// The configuration this crawler was built with
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawl from `seed` and return the pages in the order they were fetched
    ///
    /// Pages that fail to fetch are skipped. The only error is an invalid seed.
    #[instrument(skip(self), fields(max_depth = self.config.max_depth, max_pages = self.config.max_pages))]
    pub async fn crawl(&self, seed: &str) -> Result<Vec<PageDocument>, CrawlError> {
        let seed_url =
            parse_valid_url(seed).ok_or_else(|| CrawlError::InvalidSeed(seed.to_string()))?;
        info!("Starting crawl for {}", seed_url);

        let mut ctx = CrawlContext::new(&seed_url);
        let mut documents = Vec::new();

        while ctx.pages_scraped < self.config.max_pages {
            let Some((url, depth)) = ctx.queue.pop_front() else {
                break;
            };
            if ctx.visited.contains(&url) || depth > self.config.max_depth {
                continue;
            }
            ctx.visited.insert(url.clone());

            if self.config.delay_ms > 0 && ctx.visited.len() > 1 {
                tokio::time::sleep(self.config.delay()).await;
            }

            let fetched = match self.fetcher.fetch(&url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };

            let page_url = match Url::parse(&url) {
                Ok(page_url) => page_url,
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };
            let extracted = match extract_page(
                &fetched.html,
                &page_url,
                &ctx.origin,
                &self.config.exclude_tags,
                depth,
            ) {
                Ok(extracted) => extracted,
                Err(e) => {
                    warn!("Failed to extract {}: {}", url, e);
                    continue;
                }
            };

            ctx.pages_scraped += 1;
            info!(
                "Scraped {} (Page {}/{}, Images: {})",
                url,
                ctx.pages_scraped,
                self.config.max_pages,
                extracted.images.len()
            );

            if depth < self.config.max_depth {
                for link in extracted.links {
                    if !ctx.visited.contains(&link) {
                        ctx.queue.push_back((link, depth + 1));
                    }
                }
            }
            debug!("{} URLs queued", ctx.queue.len());

            documents.push(PageDocument {
                url,
                content: extracted.content,
                images: extracted.images,
                metadata: extracted.metadata,
            });
        }

        info!(
            "Crawl completed. Visited {} URLs, scraped {} pages",
            ctx.visited.len(),
            ctx.pages_scraped
        );
        Ok(documents)
    }
}

/// Crawl a website and extract its pages
///
/// # Arguments
///
/// * `url` - The URL to start from
/// * `config` - The crawler configuration
///
/// # Returns
///
/// The crawled pages in breadth-first order
pub async fn crawl_website(
    url: &str,
    config: CrawlerConfig,
) -> Result<Vec<PageDocument>, CrawlError> {
    Crawler::new(config)?.crawl(url).await
}
