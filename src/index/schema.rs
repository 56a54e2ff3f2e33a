//! # Database Schema Module
//!
//! Creates the tables behind the three storage services. Both stores keep a
//! table of collection names next to their data so that an empty collection
//! is still listed.
//!
//! - `text_collections` / `chunks`: chunk text, provenance JSON and embedding
//! - `metadata_collections` / `page_metadata`: page metadata and image JSON
//! - `collections`: the registry of indexing runs

use crate::index::error::DbError;
use libsql::{Connection, params};

const STATEMENTS: &[(&str, &str)] = &[
    (
        "text_collections table",
        "CREATE TABLE IF NOT EXISTS text_collections (
            name TEXT PRIMARY KEY,
            created_at REAL NOT NULL
        )",
    ),
    (
        "chunks table",
        "CREATE TABLE IF NOT EXISTS chunks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            chunk_key TEXT NOT NULL UNIQUE,
            url TEXT NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT NOT NULL,
            embedding BLOB NOT NULL
        )",
    ),
    (
        "index on chunks collection",
        "CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection)",
    ),
    (
        "metadata_collections table",
        "CREATE TABLE IF NOT EXISTS metadata_collections (
            name TEXT PRIMARY KEY,
            created_at REAL NOT NULL
        )",
    ),
    (
        "page_metadata table",
        "CREATE TABLE IF NOT EXISTS page_metadata (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            url TEXT NOT NULL,
            metadata TEXT NOT NULL,
            images TEXT NOT NULL,
            indexed_at REAL NOT NULL
        )",
    ),
    (
        "index on page_metadata collection",
        "CREATE INDEX IF NOT EXISTS idx_page_metadata_collection ON page_metadata(collection, url)",
    ),
    (
        "collections table",
        "CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            url TEXT NOT NULL,
            document_count INTEGER NOT NULL,
            indexed_at REAL NOT NULL,
            domain TEXT NOT NULL,
            image_count INTEGER NOT NULL
        )",
    ),
];

/// Initialize the database schema
pub async fn initialize_schema(conn: &Connection) -> Result<(), DbError> {
    for (what, sql) in STATEMENTS {
        conn.execute(sql, params![])
            .await
            .map_err(|e| DbError::Schema(format!("Failed to create {}: {}", what, e)))?;
    }
    Ok(())
}
