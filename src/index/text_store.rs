//! Text-similarity store: chunk text with embeddings, ranked by libsql's cosine distance

use async_trait::async_trait;
use libsql::params;
use rig::embeddings::{Embedding, EmbeddingModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::index::database::{Database, now_epoch};
use crate::index::error::DbError;
use crate::index::vector::encode_embedding;
use crate::processor::{Chunk, ChunkMetadata};

/// A chunk returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The chunk text
    pub content: String,

    /// Provenance stored with the chunk
    pub metadata: ChunkMetadata,

    /// `1 - cosine distance`, higher is better
    pub score: f64,
}

/// Size of a collection in the text store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    /// Number of stored chunks
    pub chunk_count: usize,

    /// Total byte length of the stored chunk text
    pub content_size: usize,
}

/// Storage service for chunk text
#[async_trait]
pub trait TextStore: Send + Sync {
    /// Create an empty collection; a no-op if it exists
    async fn create_collection(&self, collection: &str) -> Result<(), DbError>;

    /// Embed and store `chunks`, creating the collection if needed
    async fn add(&self, collection: &str, chunks: &[Chunk]) -> Result<usize, DbError>;

    /// The `top_k` chunks most similar to `query`, best first
    async fn search(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, DbError>;

    /// Names of all collections
    async fn list_collections(&self) -> Result<Vec<String>, DbError>;

    /// Whether `collection` exists
    async fn has_collection(&self, collection: &str) -> Result<bool, DbError> {
        Ok(self
            .list_collections()
            .await?
            .iter()
            .any(|name| name == collection))
    }

    /// Chunk count and text size of `collection`
    async fn stats(&self, collection: &str) -> Result<TextStats, DbError>;

    /// Remove `collection` and its chunks; returns whether it existed
    async fn delete(&self, collection: &str) -> Result<bool, DbError>;
}

/// [`TextStore`] backed by libsql, embedding text with a `rig` embedding model
#[derive(Clone)]
pub struct LibsqlTextStore<E: EmbeddingModel> {
    db: Database,
    model: E,
}

impl<E: EmbeddingModel> LibsqlTextStore<E> {
    /// Create a store over `db` that embeds with `model`
    pub fn new(db: Database, model: E) -> Self {
        Self { db, model }
    }

    async fn embed_all(&self, texts: Vec<String>) -> Result<Vec<Embedding>, DbError> {
        let batch_size = E::MAX_DOCUMENTS.max(1);
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size) {
            let batch_embeddings = self
                .model
                .embed_texts(batch.to_vec())
                .await
                .map_err(|e| DbError::Embedding(e.to_string()))?;
            if batch_embeddings.len() != batch.len() {
                return Err(DbError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    batch_embeddings.len()
                )));
            }
            embeddings.extend(batch_embeddings);
        }
        Ok(embeddings)
    }

    async fn ensure_collection(&self, collection: &str) -> Result<(), DbError> {
        self.db
            .execute(
                "INSERT OR IGNORE INTO text_collections (name, created_at) VALUES (?, ?)",
                params![collection, now_epoch()],
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<E: EmbeddingModel> TextStore for LibsqlTextStore<E> {
    async fn create_collection(&self, collection: &str) -> Result<(), DbError> {
        self.ensure_collection(collection).await
    }

    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    async fn add(&self, collection: &str, chunks: &[Chunk]) -> Result<usize, DbError> {
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let embeddings = self.embed_all(texts).await?;

        let _guard = self.db.write_lock().await;
        self.ensure_collection(collection).await?;
        if chunks.is_empty() {
            return Ok(0);
        }

        let offset = self
            .db
            .query_count(
                "SELECT COUNT(*) FROM chunks WHERE collection = ?",
                params![collection],
            )
            .await?;

        let tx = self
            .db
            .connection()
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        for (i, (chunk, embedding)) in chunks.iter().zip(embeddings.iter()).enumerate() {
            let chunk_key = format!("{}_{}", collection, offset + i as i64);
            let metadata = serde_json::to_string(&chunk.metadata)?;
            tx.execute(
                "INSERT INTO chunks (collection, chunk_key, url, content, metadata, embedding)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    collection,
                    chunk_key,
                    chunk.url.as_str(),
                    chunk.content.as_str(),
                    metadata,
                    libsql::Value::Blob(encode_embedding(&embedding.vec)),
                ],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to add chunk: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        info!("Added {} chunks to collection {}", chunks.len(), collection);
        Ok(chunks.len())
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, DbError> {
        if !self.has_collection(collection).await? {
            return Err(DbError::CollectionNotFound(collection.to_string()));
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embed_all(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Embedding("No embedding returned for query".to_string()))?;

        // Zero-length vectors have no cosine distance; rank them last
        let mut rows = self
            .db
            .execute_query(
                "SELECT content, metadata,
                        COALESCE(vector_distance_cos(embedding, vector32(?)), 2.0) AS distance
                 FROM chunks WHERE collection = ?
                 ORDER BY distance, id
                 LIMIT ?",
                params![
                    libsql::Value::Blob(encode_embedding(&query_embedding.vec)),
                    collection,
                    top_k as i64,
                ],
            )
            .await?;

        let mut hits = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let content: String = row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get content: {}", e)))?;
            let metadata: String = row
                .get(1)
                .map_err(|e| DbError::Data(format!("Failed to get metadata: {}", e)))?;
            let distance: f64 = row
                .get(2)
                .map_err(|e| DbError::Data(format!("Failed to get distance: {}", e)))?;

            hits.push(SearchHit {
                content,
                metadata: serde_json::from_str(&metadata)?,
                score: 1.0 - distance,
            });
        }

        debug!("Found {} chunks for query", hits.len());
        Ok(hits)
    }

    async fn list_collections(&self) -> Result<Vec<String>, DbError> {
        self.db
            .query_strings("SELECT name FROM text_collections ORDER BY name", params![])
            .await
    }

    async fn stats(&self, collection: &str) -> Result<TextStats, DbError> {
        let mut rows = self
            .db
            .execute_query(
                "SELECT COUNT(*), COALESCE(SUM(LENGTH(CAST(content AS BLOB))), 0)
                 FROM chunks WHERE collection = ?",
                params![collection],
            )
            .await?;

        match rows.next().await {
            Ok(Some(row)) => {
                let chunk_count: i64 = row
                    .get(0)
                    .map_err(|e| DbError::Data(format!("Failed to get chunk count: {}", e)))?;
                let content_size: i64 = row
                    .get(1)
                    .map_err(|e| DbError::Data(format!("Failed to get content size: {}", e)))?;
                Ok(TextStats {
                    chunk_count: chunk_count as usize,
                    content_size: content_size as usize,
                })
            }
            _ => Ok(TextStats::default()),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str) -> Result<bool, DbError> {
        let _guard = self.db.write_lock().await;
        self.db
            .execute("DELETE FROM chunks WHERE collection = ?", params![collection])
            .await?;
        let removed = self
            .db
            .execute(
                "DELETE FROM text_collections WHERE name = ?",
                params![collection],
            )
            .await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::database::tests::setup_test_db;
    use crate::model::MockEmbeddingModel;

    fn chunk(url: &str, content: &str, chunk_id: usize) -> Chunk {
        Chunk {
            content: content.to_string(),
            metadata: ChunkMetadata {
                chunk_id,
                source_url: url.to_string(),
                title: "Page".to_string(),
                chunk_start: 0,
                chunk_end: content.len(),
            },
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_and_search() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let store = LibsqlTextStore::new(db.clone(), MockEmbeddingModel::default());

        let chunks = vec![
            chunk("https://example.com/pricing", "Our pricing plans start at ten dollars per month", 0),
            chunk("https://example.com/team", "The team behind the company lives in Berlin", 0),
            chunk("https://example.com/contact", "Contact support by email or phone", 0),
        ];
        let added = store.add("example.com_1", &chunks).await.unwrap();
        assert_eq!(added, 3);

        let hits = store
            .search("example.com_1", "pricing plans per month", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata.source_url, "https://example.com/pricing");
        assert!(hits[0].score >= hits[1].score);

        let exact = store
            .search("example.com_1", "Contact support by email or phone", 1)
            .await
            .unwrap();
        assert_eq!(exact[0].metadata.source_url, "https://example.com/contact");
        assert!((exact[0].score - 1.0).abs() < 1e-4);

        let keys = db
            .query_strings(
                "SELECT chunk_key FROM chunks WHERE collection = ? ORDER BY id",
                params!["example.com_1"],
            )
            .await
            .unwrap();
        assert_eq!(keys, vec!["example.com_1_0", "example.com_1_1", "example.com_1_2"]);
    }

    #[tokio::test]
    async fn test_chunk_keys_continue_across_batches() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let store = LibsqlTextStore::new(db.clone(), MockEmbeddingModel::default());

        store
            .add("site_1", &[chunk("https://a.test/1", "first batch", 0)])
            .await
            .unwrap();
        store
            .add("site_1", &[chunk("https://a.test/2", "second batch", 0)])
            .await
            .unwrap();

        let keys = db
            .query_strings("SELECT chunk_key FROM chunks ORDER BY id", params![])
            .await
            .unwrap();
        assert_eq!(keys, vec!["site_1_0", "site_1_1"]);
    }

    #[tokio::test]
    async fn test_search_unknown_collection() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let store = LibsqlTextStore::new(db, MockEmbeddingModel::default());

        let err = store.search("missing", "anything", 5).await.unwrap_err();
        assert!(matches!(err, DbError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_collection_returns_no_hits() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let store = LibsqlTextStore::new(db, MockEmbeddingModel::default());

        store.create_collection("empty_1").await.unwrap();
        let hits = store.search("empty_1", "anything", 5).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(store.list_collections().await.unwrap(), vec!["empty_1"]);
    }

    #[tokio::test]
    async fn test_stats_and_delete() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let store = LibsqlTextStore::new(db, MockEmbeddingModel::default());

        store
            .add(
                "site_1",
                &[
                    chunk("https://a.test/1", "héllo", 0),
                    chunk("https://a.test/1", "world", 1),
                ],
            )
            .await
            .unwrap();

        let stats = store.stats("site_1").await.unwrap();
        assert_eq!(stats.chunk_count, 2);
        assert_eq!(stats.content_size, "héllo".len() + "world".len());

        assert!(store.delete("site_1").await.unwrap());
        assert!(!store.has_collection("site_1").await.unwrap());
        assert_eq!(store.stats("site_1").await.unwrap(), TextStats::default());
        assert!(!store.delete("site_1").await.unwrap());
    }
}
