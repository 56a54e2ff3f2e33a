//! # Text Chunking Module
//!
//! Splits page text into overlapping fixed-size windows.
//!
//! Windows start every `chunk_size - chunk_overlap` characters and run for
//! `chunk_size` characters or until the end of the text. Windows shorter than
//! `min_chunk_len` are dropped, which can only happen at the tail. Offsets
//! stored on a chunk are byte offsets into the page content, so
//! `&content[chunk_start..chunk_end]` always yields the chunk text.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::crawler::PageDocument;
use crate::processor::ChunkOptions;
use crate::processor::error::ProcessError;

/// A window of page text ready for the text store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text
    pub content: String,

    /// Provenance of the chunk
    pub metadata: ChunkMetadata,

    /// URL of the page the chunk was cut from
    pub url: String,
}

/// Provenance stored alongside each chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Index of the chunk within its page, starting at 0
    pub chunk_id: usize,

    /// URL of the source page
    pub source_url: String,

    /// Title of the source page, empty if it had none
    pub title: String,

    /// Byte offset where the chunk starts
    pub chunk_start: usize,

    /// Byte offset one past the chunk's end
    pub chunk_end: usize,
}

/// Chunk a single page
///
/// # Arguments
///
/// * `document` - The page to chunk
/// * `options` - Chunking options
///
/// # Returns
///
/// The chunks in text order
#[instrument(skip(document), fields(url = %document.url))]
pub fn chunk_document(
    document: &PageDocument,
    options: &ChunkOptions,
) -> Result<Vec<Chunk>, ProcessError> {
    options.validate()?;

    let content = document.content.as_str();
    let boundaries: Vec<usize> = content.char_indices().map(|(offset, _)| offset).collect();
    let char_len = boundaries.len();
    let byte_offset = |char_index: usize| boundaries.get(char_index).copied().unwrap_or(content.len());

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_len {
        let end = (start + options.chunk_size).min(char_len);
        if end - start >= options.min_chunk_len {
            let (chunk_start, chunk_end) = (byte_offset(start), byte_offset(end));
            chunks.push(Chunk {
                content: content[chunk_start..chunk_end].to_string(),
                metadata: ChunkMetadata {
                    chunk_id: chunks.len(),
                    source_url: document.url.clone(),
                    title: document.title().to_string(),
                    chunk_start,
                    chunk_end,
                },
                url: document.url.clone(),
            });
        }
        start += options.stride();
    }

    debug!("Split {} characters into {} chunks", char_len, chunks.len());
    Ok(chunks)
}

/// Chunk every page, keeping page order
pub fn chunk_documents(
    documents: &[PageDocument],
    options: &ChunkOptions,
) -> Result<Vec<Chunk>, ProcessError> {
    let mut chunks = Vec::new();
    for document in documents {
        chunks.extend(chunk_document(document, options)?);
    }
    Ok(chunks)
}
