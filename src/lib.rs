//! Retention job for the social diary.
//!
//! Purges soft-deleted and stale documents across the diary collections
//! without breaking references still needed by temporary users, and removes
//! the stored objects of purged images. Runs are triggered over HTTP or from
//! the command line.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod models;
pub mod observability;
pub mod retention;
pub mod routes;
pub mod storage;

#[cfg(test)]
mod tests;

use crate::{
    config::{JanitorConfig, RetentionConfig},
    db::{DbError, DbPool},
    retention::RetentionJob,
    storage::{ObjectStore, StorageError},
};

/// Shared state of the HTTP trigger.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub job: RetentionJob,
}

impl AppState {
    /// Connect to the document store and build the object store client.
    pub async fn new(config: &JanitorConfig) -> Result<Self, StartupError> {
        let db = Arc::new(DbPool::from_config(&config.database).await?);
        let objects = storage::create_object_store(&config.storage).await?;
        Ok(Self::from_parts(db, objects, config.retention.clone()))
    }

    pub fn from_parts(
        db: Arc<DbPool>,
        objects: Arc<dyn ObjectStore>,
        retention: RetentionConfig,
    ) -> Self {
        let job = RetentionJob::new(db.documents(), objects, retention);
        Self { db, job }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to connect to document store: {0}")]
    Db(#[from] DbError),

    #[error("Failed to create object store: {0}")]
    Storage(#[from] StorageError),
}

/// Build the trigger router.
pub fn build_app(config: &JanitorConfig, state: AppState) -> Router {
    let mut app = Router::new()
        .route(
            "/",
            get(routes::trigger::run_job).post(routes::trigger::run_job),
        )
        .route("/health", get(routes::health::liveness))
        .route("/health/ready", get(routes::health::readiness));

    if config.observability.metrics.enabled {
        app = app.route("/metrics", get(routes::health::metrics));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
