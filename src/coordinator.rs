//! # Index Coordinator
//!
//! Runs a crawl, chunks the pages and fans them out to the text store and the
//! metadata store, then records the run in the [`CollectionRegistry`].
//!
//! The two store writes are independent and best effort. A failure in one is
//! logged and leaves the collection visible through the other; [`reindex`]
//! rebuilds both from the recorded seed URL.
//!
//! [`reindex`]: IndexCoordinator::reindex

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use futures::future;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::crawler::urls::{domain_name, parse_valid_url};
use crate::crawler::{Crawler, CrawlerConfig, PageDocument};
use crate::error::{Error, Result};
use crate::index::{CollectionRecord, CollectionRegistry, MetadataStore, TextStore, now_epoch};
use crate::processor::{ChunkOptions, chunk_documents};

/// Per-request crawl limits overriding the coordinator's defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlOverrides {
    pub max_depth: Option<u32>,
    pub max_pages: Option<u32>,
    pub delay_ms: Option<u64>,
}

impl CrawlOverrides {
    fn apply(&self, mut config: CrawlerConfig) -> CrawlerConfig {
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        config
    }
}

/// Result of an indexing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexOutcome {
    /// Pages were found and written under `collection_name`
    Indexed {
        collection_name: String,
        document_count: usize,
        chunk_count: usize,
        image_count: usize,
    },
    /// The crawl produced no pages; nothing was written
    NoContent { url: String },
}

/// Size of one collection across both stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub pages_count: usize,
    pub images_count: usize,
    pub chunk_count: usize,
    /// Total byte length of the stored chunk text
    pub content_size: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct WriteSummary {
    chunk_count: usize,
    image_count: usize,
}

/// Drives indexing runs and owns collection lifecycle
#[derive(Clone)]
pub struct IndexCoordinator {
    text_store: Arc<dyn TextStore>,
    metadata_store: Arc<dyn MetadataStore>,
    registry: Arc<CollectionRegistry>,
    crawler_config: CrawlerConfig,
    chunk_options: ChunkOptions,
    reserved_names: Arc<Mutex<HashSet<String>>>,
}

impl IndexCoordinator {
    pub fn new(
        text_store: Arc<dyn TextStore>,
        metadata_store: Arc<dyn MetadataStore>,
        registry: Arc<CollectionRegistry>,
        crawler_config: CrawlerConfig,
        chunk_options: ChunkOptions,
    ) -> Result<Self> {
        chunk_options.validate()?;
        Ok(Self {
            text_store,
            metadata_store,
            registry,
            crawler_config,
            chunk_options,
            reserved_names: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub fn crawler_config(&self) -> &CrawlerConfig {
        &self.crawler_config
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Crawl `url` with the default limits and index the result
    pub async fn index(&self, url: &str) -> Result<IndexOutcome> {
        self.index_with(url, &CrawlOverrides::default()).await
    }

    /// Crawl `url` with `overrides` applied and index the result
    #[instrument(skip(self))]
    pub async fn index_with(&self, url: &str, overrides: &CrawlOverrides) -> Result<IndexOutcome> {
        let seed = parse_valid_url(url)
            .ok_or_else(|| Error::InvalidInput(format!("Invalid URL: {}", url)))?;
        let start_time = now_epoch();
        let domain = domain_name(&seed)
            .ok_or_else(|| Error::InvalidInput(format!("URL has no host: {}", url)))?;

        let crawler = Crawler::new(overrides.apply(self.crawler_config.clone()))?;
        let documents = crawler.crawl(url).await?;
        if documents.is_empty() {
            warn!("No content found at {}", url);
            return Ok(IndexOutcome::NoContent {
                url: url.to_string(),
            });
        }

        let collection_name = self.unique_name(&domain, start_time as i64).await?;
        info!(
            "Indexing {} pages from {} into {}",
            documents.len(),
            url,
            collection_name
        );

        let outcome = self
            .record_run(&collection_name, url, start_time, domain, &documents)
            .await;
        self.release_name(&collection_name).await;
        outcome
    }

    /// Write a fresh run to both stores and register it
    async fn record_run(
        &self,
        collection_name: &str,
        url: &str,
        start_time: f64,
        domain: String,
        documents: &[PageDocument],
    ) -> Result<IndexOutcome> {
        let summary = self.write_stores(collection_name, documents).await?;
        self.registry
            .insert(CollectionRecord {
                name: collection_name.to_string(),
                url: url.to_string(),
                document_count: documents.len(),
                indexed_at: start_time,
                domain,
                image_count: summary.image_count,
            })
            .await?;

        info!("Indexed {} pages into {}", documents.len(), collection_name);
        Ok(IndexOutcome::Indexed {
            collection_name: collection_name.to_string(),
            document_count: documents.len(),
            chunk_count: summary.chunk_count,
            image_count: summary.image_count,
        })
    }

    /// Run [`index_with`](Self::index_with) as a background task
    pub fn spawn_index(
        &self,
        url: impl Into<String>,
        overrides: CrawlOverrides,
    ) -> JoinHandle<Result<IndexOutcome>> {
        let coordinator = self.clone();
        let url = url.into();
        tokio::spawn(async move { coordinator.index_with(&url, &overrides).await })
    }

    /// Re-crawl the seed URL of `name` and rebuild both stores under the same name
    ///
    /// If the new crawl finds nothing the existing data is left untouched.
    #[instrument(skip(self))]
    pub async fn reindex(&self, name: &str) -> Result<IndexOutcome> {
        let record = self.get_collection(name).await?;
        if record.url.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Collection '{}' has no recorded URL to re-crawl",
                name
            )));
        }

        let start_time = now_epoch();
        let crawler = Crawler::new(self.crawler_config.clone())?;
        let documents = crawler.crawl(&record.url).await?;
        if documents.is_empty() {
            warn!("Re-crawl of {} found no content, keeping {}", record.url, name);
            return Ok(IndexOutcome::NoContent { url: record.url });
        }

        self.text_store.delete(name).await?;
        self.metadata_store.delete(name).await?;
        let summary = self.write_stores(name, &documents).await?;

        let domain = parse_valid_url(&record.url)
            .and_then(|url| domain_name(&url))
            .unwrap_or(record.domain);
        self.registry
            .insert(CollectionRecord {
                name: name.to_string(),
                url: record.url,
                document_count: documents.len(),
                indexed_at: start_time,
                domain,
                image_count: summary.image_count,
            })
            .await?;

        info!("Reindexed {} with {} pages", name, documents.len());
        Ok(IndexOutcome::Indexed {
            collection_name: name.to_string(),
            document_count: documents.len(),
            chunk_count: summary.chunk_count,
            image_count: summary.image_count,
        })
    }

    /// Write `documents` to both stores; fails only when both writes fail
    async fn write_stores(
        &self,
        collection: &str,
        documents: &[PageDocument],
    ) -> Result<WriteSummary> {
        let chunks = chunk_documents(documents, &self.chunk_options)?;
        let image_count = documents.iter().map(|doc| doc.images.len()).sum();

        let (text_result, metadata_result) = future::join(
            self.text_store.add(collection, &chunks),
            self.metadata_store.add(collection, documents),
        )
        .await;
        if let Err(e) = &text_result {
            error!(collection, error = %e, "Failed to write chunks");
        }
        if let Err(e) = &metadata_result {
            error!(collection, error = %e, "Failed to write page metadata");
        }

        match (text_result, metadata_result) {
            (Err(e), Err(_)) => Err(e.into()),
            (text_result, _) => Ok(WriteSummary {
                chunk_count: text_result.unwrap_or(0),
                image_count,
            }),
        }
    }

    /// `{domain}_{timestamp}`, suffixed with `_2`, `_3`, ... when already taken
    pub(crate) async fn unique_name(&self, domain: &str, timestamp: i64) -> Result<String> {
        let mut reserved = self.reserved_names.lock().await;
        let base = format!("{}_{}", domain, timestamp);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while reserved.contains(&candidate) || self.collection_exists(&candidate).await? {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        reserved.insert(candidate.clone());
        Ok(candidate)
    }

    /// Drop the in-process claim on `name` once the stores or registry guard it
    async fn release_name(&self, name: &str) {
        self.reserved_names.lock().await.remove(name);
    }

    /// Names known to either store or the registry, sorted
    ///
    /// A store that fails to list is logged and skipped.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let (text_names, metadata_names) = future::join(
            self.text_store.list_collections(),
            self.metadata_store.list_collections(),
        )
        .await;

        let mut names: BTreeSet<String> = BTreeSet::new();
        match text_names {
            Ok(text_names) => names.extend(text_names),
            Err(e) => error!(error = %e, "Failed to list text collections"),
        }
        match metadata_names {
            Ok(metadata_names) => names.extend(metadata_names),
            Err(e) => error!(error = %e, "Failed to list metadata collections"),
        }
        names.extend(self.registry.list().await.into_iter().map(|r| r.name));
        Ok(names.into_iter().collect())
    }

    /// Registry records, newest first
    pub async fn indexed_sites(&self) -> Vec<CollectionRecord> {
        self.registry.list().await
    }

    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.registry.contains(name).await
            || self.text_store.has_collection(name).await?
            || self.metadata_store.has_collection(name).await?)
    }

    /// Fail with [`Error::CollectionNotFound`] unless `name` exists
    pub async fn require_collection(&self, name: &str) -> Result<()> {
        if self.collection_exists(name).await? {
            Ok(())
        } else {
            Err(Error::CollectionNotFound(name.to_string()))
        }
    }

    /// The registry record for `name`, or one rebuilt from the stores
    pub async fn get_collection(&self, name: &str) -> Result<CollectionRecord> {
        if let Some(record) = self.registry.get(name).await {
            return Ok(record);
        }
        self.require_collection(name).await?;

        let pages = self.metadata_store.pages(name).await?;
        let distinct_urls: HashSet<&str> = pages.iter().map(|page| page.url.as_str()).collect();
        let domain = name.split_once('_').map_or(name, |(domain, _)| domain);

        Ok(CollectionRecord {
            name: name.to_string(),
            url: String::new(),
            document_count: distinct_urls.len(),
            indexed_at: 0.0,
            domain: domain.to_string(),
            image_count: 0,
        })
    }

    pub async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        self.require_collection(name).await?;
        let pages = self.metadata_store.pages(name).await?;
        let text = self.text_store.stats(name).await?;
        Ok(CollectionStats {
            pages_count: pages.len(),
            images_count: pages.iter().map(|page| page.images.len()).sum(),
            chunk_count: text.chunk_count,
            content_size: text.content_size,
        })
    }

    /// Remove `name` from both stores and the registry
    #[instrument(skip(self))]
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.require_collection(name).await?;
        self.text_store.delete(name).await?;
        self.metadata_store.delete(name).await?;
        self.registry.remove(name).await?;
        info!("Deleted collection {}", name);
        Ok(())
    }
}
