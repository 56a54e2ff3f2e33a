//! Registry of indexing runs, persisted in the `collections` table
//!
//! Records are cached in memory after [`CollectionRegistry::load`] and every
//! change is written through to the database before the cache is updated.
//! Writes take the database write lock so they never land inside a store's
//! open transaction.

use std::collections::HashMap;

use libsql::{Row, params};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::index::database::Database;
use crate::index::error::DbError;

/// Summary of one indexing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    /// Collection name, `{domain}_{timestamp}`
    pub name: String,

    /// Seed URL the run started from
    pub url: String,

    /// Number of pages indexed
    pub document_count: usize,

    /// Start of the run, in epoch seconds
    pub indexed_at: f64,

    /// Seed host without a leading `www.`
    pub domain: String,

    /// Total number of images across the indexed pages
    pub image_count: usize,
}

/// Persisted map from collection name to [`CollectionRecord`]
pub struct CollectionRegistry {
    db: Database,
    records: RwLock<HashMap<String, CollectionRecord>>,
}

impl CollectionRegistry {
    /// Load every stored record
    #[instrument(skip(db))]
    pub async fn load(db: Database) -> Result<Self, DbError> {
        let mut rows = db
            .execute_query(
                "SELECT name, url, document_count, indexed_at, domain, image_count FROM collections",
                params![],
            )
            .await?;

        let mut records = HashMap::new();
        while let Ok(Some(row)) = rows.next().await {
            let record = row_to_record(&row)?;
            records.insert(record.name.clone(), record);
        }
        debug!("Loaded {} collection records", records.len());

        Ok(Self {
            db,
            records: RwLock::new(records),
        })
    }

    /// The record for `name`, if any
    pub async fn get(&self, name: &str) -> Option<CollectionRecord> {
        self.records.read().await.get(name).cloned()
    }

    /// Whether a record exists for `name`
    pub async fn contains(&self, name: &str) -> bool {
        self.records.read().await.contains_key(name)
    }

    /// All records, newest first
    pub async fn list(&self) -> Vec<CollectionRecord> {
        let mut records: Vec<CollectionRecord> =
            self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| {
            b.indexed_at
                .total_cmp(&a.indexed_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        records
    }

    /// Insert or replace the record with the same name
    pub async fn insert(&self, record: CollectionRecord) -> Result<(), DbError> {
        let _guard = self.db.write_lock().await;
        let mut records = self.records.write().await;
        self.db
            .execute(
                "INSERT OR REPLACE INTO collections
                 (name, url, document_count, indexed_at, domain, image_count)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    record.name.as_str(),
                    record.url.as_str(),
                    record.document_count as i64,
                    record.indexed_at,
                    record.domain.as_str(),
                    record.image_count as i64,
                ],
            )
            .await?;
        records.insert(record.name.clone(), record);
        Ok(())
    }

    /// Remove the record for `name`; returns whether one existed
    pub async fn remove(&self, name: &str) -> Result<bool, DbError> {
        let _guard = self.db.write_lock().await;
        let mut records = self.records.write().await;
        self.db
            .execute("DELETE FROM collections WHERE name = ?", params![name])
            .await?;
        Ok(records.remove(name).is_some())
    }
}

fn row_to_record(row: &Row) -> Result<CollectionRecord, DbError> {
    let document_count: i64 = row
        .get(2)
        .map_err(|e| DbError::Data(format!("Failed to get document_count: {}", e)))?;
    let image_count: i64 = row
        .get(5)
        .map_err(|e| DbError::Data(format!("Failed to get image_count: {}", e)))?;

    Ok(CollectionRecord {
        name: row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get name: {}", e)))?,
        url: row
            .get(1)
            .map_err(|e| DbError::Data(format!("Failed to get url: {}", e)))?,
        document_count: document_count.max(0) as usize,
        indexed_at: row
            .get(3)
            .map_err(|e| DbError::Data(format!("Failed to get indexed_at: {}", e)))?,
        domain: row
            .get(4)
            .map_err(|e| DbError::Data(format!("Failed to get domain: {}", e)))?,
        image_count: image_count.max(0) as usize,
    })
}
