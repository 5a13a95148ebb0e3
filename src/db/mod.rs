mod error;
pub mod filter;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(all(test, feature = "database-sqlite"))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use filter::{FieldValue, Filter};
pub use repos::*;

use crate::config::DatabaseConfig;

enum PoolStorage {
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(not(feature = "database-sqlite"))]
    _None(std::convert::Infallible),
}

/// Database pool holding the document store.
///
/// The store is created once at construction time and shared behind an `Arc`.
pub struct DbPool {
    inner: PoolStorage,
    documents: Arc<dyn DocumentStore>,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        DbPool {
            documents: Arc::new(sqlite::SqliteDocumentStore::new(pool.clone())),
            inner: PoolStorage::Sqlite(pool),
        }
    }

    /// Create a database pool from configuration
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let options = cfg
                    .connect_options()
                    .map_err(|e| DbError::Internal(format!("Invalid SQLite URL: {}", e)))?;
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .connect_with(options)
                    .await?;

                let db = Self::from_sqlite(pool);
                if cfg.ensure_schema {
                    db.ensure_schema().await?;
                }
                Ok(db)
            }
        }
    }

    /// Create any missing collection tables.
    pub async fn ensure_schema(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                tracing::info!("Ensuring SQLite collection schema");
                sqlite::SqliteDocumentStore::new(pool.clone())
                    .ensure_schema()
                    .await?;
                tracing::info!("SQLite collection schema ready");
                Ok(())
            }
            #[cfg(not(feature = "database-sqlite"))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }

    /// Cheap connectivity probe for health checks.
    pub async fn ping(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            #[cfg(not(feature = "database-sqlite"))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }

    /// Get the document store.
    pub fn documents(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.documents)
    }
}
