//! # Processor Configuration Module
//!
//! Chunking parameters for the indexing pipeline. Sizes are measured in
//! characters, not bytes or words.

use crate::processor::error::ProcessError;

/// Configuration for chunking text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Window length in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive windows
    pub chunk_overlap: usize,

    /// Windows shorter than this are discarded
    pub min_chunk_len: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_len: 100,
        }
    }
}

impl ChunkOptions {
    /// Create a new builder
    pub fn builder() -> ChunkOptionsBuilder {
        ChunkOptionsBuilder::new()
    }

    /// Distance between the starts of consecutive windows
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Check that the window moves forward
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.chunk_size == 0 {
            return Err(ProcessError::InvalidOptions(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ProcessError::InvalidOptions(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Builder for ChunkOptions
#[derive(Debug, Default)]
pub struct ChunkOptionsBuilder {
    options: ChunkOptions,
}

impl ChunkOptionsBuilder {
    /// Create a new builder with default options
    pub fn new() -> Self {
        Self {
            options: ChunkOptions::default(),
        }
    }

    /// Set the window length
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.options.chunk_size = chunk_size;
        self
    }

    /// Set the overlap between windows
    pub fn chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.options.chunk_overlap = chunk_overlap;
        self
    }

    /// Set the minimum kept window length
    pub fn min_chunk_len(mut self, min_chunk_len: usize) -> Self {
        self.options.min_chunk_len = min_chunk_len;
        self
    }

    /// Build and validate the options
    pub fn build(self) -> Result<ChunkOptions, ProcessError> {
        self.options.validate()?;
        Ok(self.options)
    }
}
