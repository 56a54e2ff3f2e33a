//! # RAG engine
//!
//! One entry point wiring the crawler, the stores, the coordinator and the
//! query router over a single database.
//!
//! ```rust,no_run
//! use sitechat::config::AppConfig;
//! use sitechat::engine::RagEngine;
//!
//! # async fn example() -> sitechat::Result<()> {
//! let config = AppConfig::from_env()?;
//! let engine = RagEngine::open(&config).await?;
//!
//! if let sitechat::coordinator::IndexOutcome::Indexed { collection_name, .. } =
//!     engine.index("https://example.com").await?
//! {
//!     let answer = engine.query("What do you offer?", &collection_name, 5).await?;
//!     println!("{}", answer.response);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::coordinator::{CollectionStats, CrawlOverrides, IndexCoordinator, IndexOutcome};
use crate::crawler::CrawlerConfig;
use crate::error::Result;
use crate::index::{
    CollectionRecord, CollectionRegistry, Database, LibsqlMetadataStore, LibsqlTextStore,
    MetadataStore, StoredImage, TextStore,
};
use crate::model::{Client, GeminiClient};
use crate::processor::ChunkOptions;
use crate::search::gallery::{self, ImagePage, ImageQuery};
use crate::search::{QueryAnswer, QueryRouter, RigGenerator};

/// Number of chunks retrieved when the caller does not say
pub const DEFAULT_TOP_K: usize = 5;

/// Knobs for [`RagEngine::new`]
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub crawler: CrawlerConfig,
    pub chunking: ChunkOptions,
    pub base_url: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for EngineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            crawler: CrawlerConfig::builder()
                .max_depth(config.max_depth)
                .max_pages(config.max_pages)
                .build(),
            chunking: ChunkOptions::default(),
            base_url: config.base_url.clone(),
        }
    }
}

/// Indexing and question answering over one database
#[derive(Clone)]
pub struct RagEngine {
    coordinator: IndexCoordinator,
    router: Arc<QueryRouter>,
    metadata_store: Arc<dyn MetadataStore>,
}

impl RagEngine {
    /// Open the configured database with rate-limited Gemini models
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let client = GeminiClient::new_gemini_with_key(config.require_api_key()?, &config.model)?;
        let db = Database::new_from_path(&config.database_path).await?;
        Self::new(db, client, EngineOptions::from(config)).await
    }

    /// Build an engine from any pair of `rig` models
    #[instrument(skip_all)]
    pub async fn new<C, E>(db: Database, client: Client<C, E>, options: EngineOptions) -> Result<Self>
    where
        C: CompletionModel + 'static,
        E: EmbeddingModel + 'static,
    {
        let (completion_model, embedding_model) = client.into_parts();

        let text_store: Arc<dyn TextStore> =
            Arc::new(LibsqlTextStore::new(db.clone(), embedding_model));
        let metadata_store: Arc<dyn MetadataStore> =
            Arc::new(LibsqlMetadataStore::new(db.clone()));
        let registry = Arc::new(CollectionRegistry::load(db).await?);
        info!("Loaded {} collection records", registry.list().await.len());

        let coordinator = IndexCoordinator::new(
            text_store.clone(),
            metadata_store.clone(),
            registry,
            options.crawler,
            options.chunking,
        )?;
        let router = QueryRouter::new(
            text_store,
            metadata_store.clone(),
            Arc::new(RigGenerator::new(completion_model)),
            options.base_url,
        );

        Ok(Self {
            coordinator,
            router: Arc::new(router),
            metadata_store,
        })
    }

    pub fn coordinator(&self) -> &IndexCoordinator {
        &self.coordinator
    }

    pub fn router(&self) -> &QueryRouter {
        &self.router
    }

    pub async fn index(&self, url: &str) -> Result<IndexOutcome> {
        self.coordinator.index(url).await
    }

    pub async fn index_with(&self, url: &str, overrides: &CrawlOverrides) -> Result<IndexOutcome> {
        self.coordinator.index_with(url, overrides).await
    }

    /// Index in the background; poll [`list_collections`](Self::list_collections) or await the handle
    pub fn spawn_index(
        &self,
        url: impl Into<String>,
        overrides: CrawlOverrides,
    ) -> JoinHandle<Result<IndexOutcome>> {
        self.coordinator.spawn_index(url, overrides)
    }

    pub async fn reindex(&self, name: &str) -> Result<IndexOutcome> {
        self.coordinator.reindex(name).await
    }

    /// Answer `question` from collection `name`
    pub async fn query(&self, question: &str, name: &str, top_k: usize) -> Result<QueryAnswer> {
        self.coordinator.require_collection(name).await?;
        Ok(self.router.route(question, name, top_k).await?)
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        self.coordinator.list_collections().await
    }

    pub async fn indexed_sites(&self) -> Vec<CollectionRecord> {
        self.coordinator.indexed_sites().await
    }

    pub async fn get_collection(&self, name: &str) -> Result<CollectionRecord> {
        self.coordinator.get_collection(name).await
    }

    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.coordinator.delete_collection(name).await
    }

    pub async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        self.coordinator.collection_stats(name).await
    }

    /// Images of `name` in write order, at most `limit`
    pub async fn get_images(&self, name: &str, limit: Option<usize>) -> Result<Vec<StoredImage>> {
        self.coordinator.require_collection(name).await?;
        Ok(self.metadata_store.get_images(name, limit).await?)
    }

    /// One filtered, sorted page of the images of `name`
    pub async fn list_images(&self, name: &str, query: &ImageQuery) -> Result<ImagePage> {
        query.validate()?;
        let images = self.get_images(name, None).await?;
        Ok(gallery::list_images(name, &images, query)?)
    }

    /// Distinct image categories of `name`
    pub async fn image_categories(&self, name: &str) -> Result<Vec<String>> {
        let images = self.get_images(name, None).await?;
        Ok(gallery::categories(&images))
    }
}
