//! Deterministic embedding model for tests and offline runs
//!
//! Each lowercase alphanumeric token is hashed (FNV-1a) into one of `ndims`
//! buckets, giving a bag-of-words vector. Texts that share words end up close
//! under cosine similarity.

use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};

/// Hashed bag-of-words embedding model
#[derive(Debug, Clone)]
pub struct MockEmbeddingModel {
    ndims: usize,
}

impl MockEmbeddingModel {
    /// Create a model producing vectors of `ndims` dimensions
    pub fn new(ndims: usize) -> Self {
        Self {
            ndims: ndims.max(1),
        }
    }

    /// Embed one text
    pub fn embed(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0; self.ndims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) % self.ndims as u64;
            vec[bucket as usize] += 1.0;
        }
        vec
    }
}

impl Default for MockEmbeddingModel {
    fn default() -> Self {
        Self::new(256)
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

impl EmbeddingModel for MockEmbeddingModel {
    const MAX_DOCUMENTS: usize = 100;

    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts
            .into_iter()
            .map(|document| Embedding {
                vec: self.embed(&document),
                document,
            })
            .collect())
    }
}
