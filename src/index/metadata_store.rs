//! Structured-metadata store: per-page metadata and image lists

use async_trait::async_trait;
use libsql::{Row, params};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::crawler::{ImageRef, PageDocument, PageMetadata};
use crate::index::database::{Database, now_epoch};
use crate::index::error::DbError;

/// One stored page entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL of the page
    pub url: String,

    /// Metadata extracted from the page
    pub metadata: PageMetadata,

    /// Images found on the page
    pub images: Vec<ImageRef>,

    /// When the entry was written, in epoch seconds
    pub indexed_at: f64,
}

/// An image together with the page it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    /// The image reference as extracted
    #[serde(flatten)]
    pub image: ImageRef,

    /// URL of the page the image appeared on
    pub page_url: String,

    /// When the page entry was written, in epoch seconds
    pub indexed_at: f64,
}

/// Storage service for page metadata and images
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Store one entry per document, creating the collection if needed
    async fn add(&self, collection: &str, documents: &[PageDocument]) -> Result<usize, DbError>;

    /// Images of `collection` in page write order, at most `limit` when given
    ///
    /// An unknown collection yields no images.
    async fn get_images(
        &self,
        collection: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StoredImage>, DbError>;

    /// The first entry stored for `url`
    async fn search_by_url(&self, collection: &str, url: &str)
    -> Result<Option<PageRecord>, DbError>;

    /// Every entry of `collection` in write order
    async fn pages(&self, collection: &str) -> Result<Vec<PageRecord>, DbError>;

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

    /// Remove `collection` and its entries; returns whether it existed
    async fn delete(&self, collection: &str) -> Result<bool, DbError>;
}

/// [`MetadataStore`] backed by libsql
#[derive(Clone)]
pub struct LibsqlMetadataStore {
    db: Database,
}

impl LibsqlMetadataStore {
    /// Create a store over `db`
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_record(row: &Row) -> Result<PageRecord, DbError> {
        let url: String = row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get url: {}", e)))?;
        let metadata: String = row
            .get(1)
            .map_err(|e| DbError::Data(format!("Failed to get metadata: {}", e)))?;
        let images: String = row
            .get(2)
            .map_err(|e| DbError::Data(format!("Failed to get images: {}", e)))?;
        let indexed_at: f64 = row
            .get(3)
            .map_err(|e| DbError::Data(format!("Failed to get indexed_at: {}", e)))?;

        Ok(PageRecord {
            url,
            metadata: serde_json::from_str(&metadata)?,
            images: serde_json::from_str(&images)?,
            indexed_at,
        })
    }
}

#[async_trait]
impl MetadataStore for LibsqlMetadataStore {
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    async fn add(&self, collection: &str, documents: &[PageDocument]) -> Result<usize, DbError> {
        let _guard = self.db.write_lock().await;

        let tx = self
            .db
            .connection()
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        tx.execute(
            "INSERT OR IGNORE INTO metadata_collections (name, created_at) VALUES (?, ?)",
            params![collection, now_epoch()],
        )
        .await
        .map_err(|e| DbError::Query(format!("Failed to create collection: {}", e)))?;

        for document in documents {
            let metadata = serde_json::to_string(&document.metadata)?;
            let images = serde_json::to_string(&document.images)?;
            tx.execute(
                "INSERT INTO page_metadata (collection, url, metadata, images, indexed_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![collection, document.url.as_str(), metadata, images, now_epoch()],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to add page metadata: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        info!(
            "Added metadata for {} documents to collection {}",
            documents.len(),
            collection
        );
        Ok(documents.len())
    }

    async fn get_images(
        &self,
        collection: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StoredImage>, DbError> {
        let mut images = Vec::new();
        for page in self.pages(collection).await? {
            for image in page.images {
                if limit.is_some_and(|limit| images.len() >= limit) {
                    return Ok(images);
                }
                images.push(StoredImage {
                    image,
                    page_url: page.url.clone(),
                    indexed_at: page.indexed_at,
                });
            }
        }
        Ok(images)
    }

    async fn search_by_url(
        &self,
        collection: &str,
        url: &str,
    ) -> Result<Option<PageRecord>, DbError> {
        let mut rows = self
            .db
            .execute_query(
                "SELECT url, metadata, images, indexed_at FROM page_metadata
                 WHERE collection = ? AND url = ? ORDER BY id LIMIT 1",
                params![collection, url],
            )
            .await?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(Self::row_to_record(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DbError::Query(format!("Failed to read page metadata: {}", e))),
        }
    }

    async fn pages(&self, collection: &str) -> Result<Vec<PageRecord>, DbError> {
        let mut rows = self
            .db
            .execute_query(
                "SELECT url, metadata, images, indexed_at FROM page_metadata
                 WHERE collection = ? ORDER BY id",
                params![collection],
            )
            .await?;

        let mut pages = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            pages.push(Self::row_to_record(&row)?);
        }
        Ok(pages)
    }

    async fn list_collections(&self) -> Result<Vec<String>, DbError> {
        self.db
            .query_strings(
                "SELECT name FROM metadata_collections ORDER BY name",
                params![],
            )
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str) -> Result<bool, DbError> {
        let _guard = self.db.write_lock().await;
        self.db
            .execute(
                "DELETE FROM page_metadata WHERE collection = ?",
                params![collection],
            )
            .await?;
        let removed = self
            .db
            .execute(
                "DELETE FROM metadata_collections WHERE name = ?",
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

    fn image(src: &str, alt: &str) -> ImageRef {
        ImageRef {
            src: src.to_string(),
            alt: alt.to_string(),
            width: "100".to_string(),
            height: String::new(),
            title: String::new(),
        }
    }

    fn document(url: &str, images: Vec<ImageRef>) -> PageDocument {
        let mut metadata = PageMetadata {
            title: Some(format!("Title of {}", url)),
            depth: 1,
            html_length: 1234,
            image_count: images.len(),
            ..Default::default()
        };
        metadata
            .headings
            .insert(PageMetadata::heading_key(1), "Welcome".to_string());
        PageDocument {
            url: url.to_string(),
            content: "content".to_string(),
            images,
            metadata,
        }
    }

    #[tokio::test]
    async fn test_add_and_get_images() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let store = LibsqlMetadataStore::new(db);

        let documents = vec![
            document(
                "https://example.com",
                vec![
                    image("https://example.com/logo.png", "Company logo"),
                    image("https://example.com/hero.jpg", "Hero banner"),
                ],
            ),
            document("https://example.com/about", vec![]),
            document(
                "https://example.com/shop",
                vec![image("https://example.com/p1.jpg", "Product one")],
            ),
        ];
        assert_eq!(store.add("example.com_1", &documents).await.unwrap(), 3);

        let images = store.get_images("example.com_1", None).await.unwrap();
        let srcs: Vec<&str> = images.iter().map(|img| img.image.src.as_str()).collect();
        assert_eq!(
            srcs,
            vec![
                "https://example.com/logo.png",
                "https://example.com/hero.jpg",
                "https://example.com/p1.jpg"
            ]
        );
        assert_eq!(images[2].page_url, "https://example.com/shop");
        assert!(images[0].indexed_at > 0.0);

        let limited = store.get_images("example.com_1", Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);

        assert!(store.get_images("missing", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_url_round_trips_metadata() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let store = LibsqlMetadataStore::new(db);

        let documents = vec![document("https://example.com/about", vec![])];
        store.add("example.com_1", &documents).await.unwrap();

        let record = store
            .search_by_url("example.com_1", "https://example.com/about")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.metadata, documents[0].metadata);
        assert_eq!(record.metadata.headings(1), Some("Welcome"));

        let missing = store
            .search_by_url("example.com_1", "https://example.com/nope")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let store = LibsqlMetadataStore::new(db);

        store
            .add("a_1", &[document("https://a.test", vec![])])
            .await
            .unwrap();
        store.add("b_2", &[]).await.unwrap();

        assert_eq!(store.list_collections().await.unwrap(), vec!["a_1", "b_2"]);

        assert!(store.delete("a_1").await.unwrap());
        assert_eq!(store.list_collections().await.unwrap(), vec!["b_2"]);
        assert!(store.pages("a_1").await.unwrap().is_empty());
        assert!(!store.delete("a_1").await.unwrap());
    }
}
