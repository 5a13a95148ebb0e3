use async_trait::async_trait;

use crate::{
    db::{error::DbResult, filter::Filter},
    models::{Collection, Document},
};

/// A document store that hands out transactional sessions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Begin a multi-document transaction.
    ///
    /// A session that is dropped without [`DocumentSession::commit`] rolls back.
    async fn begin(&self) -> DbResult<Box<dyn DocumentSession>>;

    /// Name of the backend, for logs.
    fn backend_name(&self) -> &'static str;
}

/// Reads and deletes performed inside one transaction.
#[async_trait]
pub trait DocumentSession: Send {
    /// Return every document of `collection` matching `filter`.
    async fn find(&mut self, collection: Collection, filter: &Filter) -> DbResult<Vec<Document>>;

    /// Delete every document of `collection` matching `filter`, returning the
    /// number of documents removed. Deleting nothing is not an error.
    async fn delete_many(&mut self, collection: Collection, filter: &Filter) -> DbResult<u64>;

    /// Make every delete issued in this session durable.
    async fn commit(self: Box<Self>) -> DbResult<()>;

    /// Discard every delete issued in this session.
    async fn rollback(self: Box<Self>) -> DbResult<()>;
}
