//! Content processor module for RAG
//!
//! This module turns crawled pages into retrieval units: each page's text is
//! cut into overlapping fixed-size windows, and every window carries enough
//! provenance (source URL, title, offsets) to be cited at query time.

mod chunking;
mod config;
mod error;

pub use chunking::{Chunk, ChunkMetadata, chunk_document, chunk_documents};
pub use config::{ChunkOptions, ChunkOptionsBuilder};
pub use error::ProcessError;
