//! # sitechat - chat with a website through retrieval-augmented generation
//!
//! This crate crawls a website into a local index and answers questions
//! about it. The pipeline has two halves:
//!
//! - **Indexing**: a bounded breadth-first crawl over same-origin links,
//!   text/link/image/metadata extraction, fixed-size overlapping chunks, and
//!   a dual write into a text-similarity store and a metadata store, recorded
//!   in a persisted collection registry.
//! - **Answering**: each question is classified as an image or a text
//!   question. Image questions list the collection's images; text questions
//!   retrieve the most similar chunks and ask an LLM to answer from them.
//!
//! Storage is a single local libsql database. Models are reached through
//! `rig` and rate limited with `governor`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitechat::coordinator::CrawlOverrides;
//! use sitechat::engine::{EngineOptions, RagEngine};
//! use sitechat::index::Database;
//! use sitechat::model::GeminiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GeminiClient::new_gemini_with_key("your-api-key", "gemini-1.5-pro")?;
//!     let db = Database::new_from_path("sitechat.db").await?;
//!     let engine = RagEngine::new(db, client, EngineOptions::default()).await?;
//!
//!     let overrides = CrawlOverrides {
//!         max_pages: Some(10),
//!         ..Default::default()
//!     };
//!     let outcome = engine.spawn_index("https://example.com", overrides).await??;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

mod error;
pub mod model;

pub mod config;
pub mod coordinator;
pub mod crawler;
pub mod engine;
pub mod index;
pub mod processor;
pub mod search;

pub use error::{Error, ErrorKind, ErrorReport, Result};

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::coordinator::{CollectionStats, CrawlOverrides, IndexOutcome};
    pub use crate::engine::{DEFAULT_TOP_K, EngineOptions, RagEngine};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::index::CollectionRecord;
    pub use crate::search::{ImageQuery, ImageSort, QueryAnswer, QueryKind};
}
