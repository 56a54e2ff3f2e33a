//! Index manager module for RAG
//!
//! This module owns everything that is persisted: the text-similarity store
//! (chunks and embeddings), the structured-metadata store (page metadata and
//! images) and the registry of indexing runs. All three share one libsql
//! database handle.

pub(crate) mod database;
pub mod error;
mod metadata_store;
mod registry;
mod schema;
mod text_store;
mod vector;

pub use database::{Database, now_epoch};
pub use error::DbError;
pub use metadata_store::{LibsqlMetadataStore, MetadataStore, PageRecord, StoredImage};
pub use registry::{CollectionRecord, CollectionRegistry};
pub use text_store::{LibsqlTextStore, SearchHit, TextStats, TextStore};
pub use vector::encode_embedding;
