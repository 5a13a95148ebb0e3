use async_trait::async_trait;
use sqlx::{
    Row, Sqlite, SqlitePool, Transaction, query::Query, sqlite::SqliteArguments,
};

use super::render::{SqlArg, SqlFilter, render};
use crate::{
    db::{
        error::{DbError, DbResult},
        filter::Filter,
        repos::{DocumentSession, DocumentStore},
    },
    models::{Collection, Document},
};

/// SQLite-backed document store: one table per collection, each row holding
/// the document identifier and its JSON body.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the collection tables that do not exist yet.
    pub async fn ensure_schema(&self) -> DbResult<()> {
        for collection in Collection::ALL {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY NOT NULL, body TEXT NOT NULL)",
                collection.as_str()
            ))
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Insert or replace a document outside of any session.
    pub async fn insert(&self, collection: Collection, document: &Document) -> DbResult<()> {
        let body = serde_json::to_string(&document.body)?;
        sqlx::query(&format!(
            "INSERT OR REPLACE INTO {} (id, body) VALUES (?, ?)",
            collection.as_str()
        ))
        .bind(&document.id)
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Count the documents of `collection` matching `filter`.
    pub async fn count(&self, collection: Collection, filter: &Filter) -> DbResult<u64> {
        let SqlFilter { sql, args } = render(filter);
        let statement = format!(
            "SELECT COUNT(*) AS n FROM {} WHERE {}",
            collection.as_str(),
            sql
        );
        let row = bind_args(sqlx::query(&statement), args)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn begin(&self) -> DbResult<Box<dyn DocumentSession>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteDocumentSession { tx }))
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

/// A session over one SQLite transaction. Dropping it rolls back.
pub struct SqliteDocumentSession {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl DocumentSession for SqliteDocumentSession {
    async fn find(&mut self, collection: Collection, filter: &Filter) -> DbResult<Vec<Document>> {
        if filter.is_unsatisfiable() {
            return Ok(Vec::new());
        }

        let SqlFilter { sql, args } = render(filter);
        let statement = format!(
            "SELECT id, body FROM {} WHERE {}",
            collection.as_str(),
            sql
        );
        let rows = bind_args(sqlx::query(&statement), args)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.get("id");
                let body: String = row.get("body");
                match serde_json::from_str(&body) {
                    Ok(body) => Ok(Document { id, body }),
                    Err(source) => Err(DbError::Malformed {
                        collection,
                        id,
                        source,
                    }),
                }
            })
            .collect()
    }

    async fn delete_many(&mut self, collection: Collection, filter: &Filter) -> DbResult<u64> {
        if filter.is_unsatisfiable() {
            return Ok(0);
        }

        let SqlFilter { sql, args } = render(filter);
        let statement = format!("DELETE FROM {} WHERE {}", collection.as_str(), sql);
        let result = bind_args(sqlx::query(&statement), args)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn bind_args<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    args: Vec<SqlArg>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            SqlArg::Int(v) => query.bind(v),
            SqlArg::Text(v) => query.bind(v),
        };
    }
    query
}
