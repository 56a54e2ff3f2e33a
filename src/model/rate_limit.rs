//! Quota wrapper shared by the completion and embedding models
//!
//! Every call waits on a `governor` limiter before it reaches the provider,
//! so a large indexing run slows down instead of failing with quota errors.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rig::completion::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use tracing::{Instrument, debug_span, info_span};

use crate::error::{Error, Result};

/// A limiter admitting `requests` calls per minute
pub fn per_minute_limiter(requests: u32) -> Result<DefaultDirectRateLimiter> {
    let requests = NonZeroU32::new(requests)
        .ok_or_else(|| Error::InvalidInput("rate limit must be at least 1 per minute".to_string()))?;
    Ok(RateLimiter::direct(Quota::per_minute(requests)))
}

/// A model whose calls are held back by a rate limiter
#[derive(Clone)]
pub struct RateLimited<M> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimited<M> {
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }

    /// Wrap `model` with a quota of `requests` calls per minute
    pub fn per_minute(model: M, requests: u32) -> Result<Self> {
        Ok(Self::new(model, per_minute_limiter(requests)?))
    }

    pub fn inner(&self) -> &M {
        &self.model
    }
}

impl<M: std::fmt::Debug> std::fmt::Debug for RateLimited<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimited")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl<M: CompletionModel> CompletionModel for RateLimited<M> {
    type Response = M::Response;

    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse<Self::Response>, CompletionError> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("completion_quota"))
            .await;
        self.model
            .completion(request)
            .instrument(info_span!("completion"))
            .await
    }
}

impl<M: EmbeddingModel> EmbeddingModel for RateLimited<M> {
    const MAX_DOCUMENTS: usize = M::MAX_DOCUMENTS;

    fn ndims(&self) -> usize {
        self.model.ndims()
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> std::result::Result<Vec<Embedding>, EmbeddingError> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("embedding_quota"))
            .await;
        self.model
            .embed_texts(texts)
            .instrument(info_span!("embed_texts"))
            .await
    }
}
