//! # LLM Client Module
//!
//! This module provides a unified client interface for the two model services
//! the pipeline needs: a completion model that writes answers and an embedding
//! model that places chunks and queries in a vector space. Both are rate
//! limited so that a large indexing run cannot exhaust the API quota.
//!
//! ## Key Components
//!
//! - `Client`: wraps a completion model and an embedding model
//! - `RateLimited`: governor-backed wrapper for either kind of model
//! - `MockCompletionModel` / `MockEmbeddingModel`: offline stand-ins

use rig::{completion::CompletionModel, embeddings::EmbeddingModel, providers::gemini};

use crate::error::{Error, Result};

pub mod mock_embedding;
pub mod mock_model;
pub mod rate_limit;

pub use mock_embedding::MockEmbeddingModel;
pub use mock_model::MockCompletionModel;
pub use rate_limit::{RateLimited, per_minute_limiter};

/// Completion model used when none is configured
pub const DEFAULT_COMPLETION_MODEL: &str = "gemini-1.5-pro";

/// Production client: rate-limited Gemini completion and embedding models
pub type GeminiClient = Client<
    RateLimited<gemini::completion::CompletionModel>,
    RateLimited<gemini::embedding::EmbeddingModel>,
>;

/// Completion calls allowed per minute
pub const COMPLETION_REQUESTS_PER_MINUTE: u32 = 1000;

/// Embedding calls allowed per minute
pub const EMBEDDING_REQUESTS_PER_MINUTE: u32 = 1500;

#[derive(Debug, Clone)]
pub struct Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    completion_model: C,
    embedding_model: E,
}

impl GeminiClient {
    /// Build a Gemini client from an explicit API key
    pub fn new_gemini_with_key(api_key: &str, completion_model: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::InvalidInput("Gemini API key is empty".to_string()));
        }
        let gemini_client = gemini::Client::new(api_key);
        Self::new_gemini(gemini_client, completion_model)
    }

    pub fn new_gemini(gemini_client: gemini::Client, completion_model: &str) -> Result<Self> {
        let completion_model = RateLimited::per_minute(
            gemini_client.completion_model(completion_model),
            COMPLETION_REQUESTS_PER_MINUTE,
        )?;
        let embedding_model = RateLimited::per_minute(
            gemini_client.embedding_model(gemini::embedding::EMBEDDING_004),
            EMBEDDING_REQUESTS_PER_MINUTE,
        )?;
        Ok(Self {
            completion_model,
            embedding_model,
        })
    }
}

impl Client<MockCompletionModel, MockEmbeddingModel> {
    /// Client that never leaves the process
    pub fn new_mock() -> Self {
        Self::new(MockCompletionModel::new(), MockEmbeddingModel::default())
    }
}

impl<C, E> Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    /// Pair an arbitrary completion model with an embedding model
    pub fn new(completion_model: C, embedding_model: E) -> Self {
        Self {
            completion_model,
            embedding_model,
        }
    }

    pub fn completion(&self) -> &C {
        &self.completion_model
    }

    pub fn embedding(&self) -> &E {
        &self.embedding_model
    }

    /// Split into the completion and embedding models
    pub fn into_parts(self) -> (C, E) {
        (self.completion_model, self.embedding_model)
    }
}
