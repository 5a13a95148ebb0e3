use thiserror::Error;

use crate::{db::DbError, storage::StorageError};

/// Anything that aborts a retention run. Nothing is retried.
#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("Document store error: {0}")]
    Db(#[from] DbError),

    #[error("Object store error: {0}")]
    Storage(#[from] StorageError),
}

pub type RetentionResult<T> = Result<T, RetentionError>;
