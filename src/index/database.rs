//! Database handle shared by the stores and the registry

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use libsql::{Connection, Rows};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

use crate::index::error::DbError;
use crate::index::schema;

/// Database manager for the index
///
/// Clones share one connection. Multi-statement writes take the write lock
/// so that transactions from concurrent indexing jobs never interleave.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Create a new database manager
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection) -> Result<Self, DbError> {
        schema::initialize_schema(&conn).await?;
        debug!("Database schema ready");

        Ok(Self {
            conn,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create a new database manager from a path
    pub async fn new_from_path(path: &str) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn).await
    }

    /// The underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Serialize a multi-statement write
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Execute a custom query with parameters
    pub async fn execute_query<P>(&self, sql: &str, params: P) -> Result<Rows, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .query(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute query: {}", e)))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute<P>(&self, sql: &str, params: P) -> Result<u64, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .execute(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute statement: {}", e)))
    }

    /// Collect the first column of every row as a string
    pub async fn query_strings<P>(&self, sql: &str, params: P) -> Result<Vec<String>, DbError>
    where
        P: libsql::params::IntoParams,
    {
        let mut rows = self.execute_query(sql, params).await?;
        let mut values = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            values.push(
                row.get::<String>(0)
                    .map_err(|e| DbError::Data(format!("Failed to get value: {}", e)))?,
            );
        }
        Ok(values)
    }

    /// Read a single integer, such as a `COUNT(*)`
    pub async fn query_count<P>(&self, sql: &str, params: P) -> Result<i64, DbError>
    where
        P: libsql::params::IntoParams,
    {
        let mut rows = self.execute_query(sql, params).await?;
        match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map_err(|e| DbError::Data(format!("Failed to get count: {}", e))),
            Ok(None) => Ok(0),
            Err(e) => Err(DbError::Query(format!("Failed to read count: {}", e))),
        }
    }
}

/// Seconds since the Unix epoch, with sub-second precision
pub fn now_epoch() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}
