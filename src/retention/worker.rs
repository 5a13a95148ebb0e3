//! Retention job: one transaction around every stage.
//!
//! A run begins a document-store session, then executes inactive-user
//! processing, temporary-user processing, the global sweep and the image
//! reaper in that order. It commits only if every stage succeeded; any error
//! rolls the session back and the run reports `Fail`.

use std::{collections::BTreeMap, sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use super::{
    RetentionResult,
    catalog::RetentionCatalog,
    guard::{ProtectedCategory, ProtectionRegistry},
    images::reap_images,
    owner_cleanup::{process_inactive_users, process_temp_users},
    sweep::run_global_sweep,
};
use crate::{
    config::RetentionConfig,
    db::{DbError, DbResult, DocumentSession, DocumentStore, Filter},
    models::Collection,
    observability::metrics,
    storage::ObjectStore,
};

/// Results from a single retention run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RetentionRunResult {
    /// Documents deleted, per collection.
    pub deleted: BTreeMap<Collection, u64>,
    /// Objects removed from the object store.
    pub objects_deleted: u64,
    /// Size of every protection set when the run finished.
    pub protected: BTreeMap<ProtectedCategory, usize>,
}

impl RetentionRunResult {
    pub fn record(&mut self, collection: Collection, count: u64) {
        *self.deleted.entry(collection).or_default() += count;
    }

    pub fn deleted_from(&self, collection: Collection) -> u64 {
        self.deleted.get(&collection).copied().unwrap_or(0)
    }

    /// Total number of documents deleted across all collections.
    pub fn total(&self) -> u64 {
        self.deleted.values().sum()
    }

    /// Check if anything was deleted.
    pub fn has_deletions(&self) -> bool {
        self.total() > 0 || self.objects_deleted > 0
    }
}

/// Literal outcome reported to whoever triggered the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Fail,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Fail => "Fail",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The retention job with its collaborators.
#[derive(Clone)]
pub struct RetentionJob {
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    config: RetentionConfig,
}

impl RetentionJob {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        config: RetentionConfig,
    ) -> Self {
        Self {
            documents,
            objects,
            config,
        }
    }

    /// Run once against the current time.
    pub async fn run(&self) -> RetentionResult<RetentionRunResult> {
        run_retention(
            self.documents.as_ref(),
            self.objects.as_ref(),
            &self.config,
            Utc::now(),
        )
        .await
    }

    /// Run once and collapse the result into the reported outcome.
    ///
    /// Logs the run summary and records metrics for committed deletions.
    pub async fn trigger(&self) -> JobOutcome {
        let started = Instant::now();
        let outcome = match self.run().await {
            Ok(result) => {
                tracing::info!(
                    total = result.total(),
                    objects_deleted = result.objects_deleted,
                    deleted = ?result.deleted,
                    protected = ?result.protected,
                    "Retention run committed"
                );
                for (collection, count) in &result.deleted {
                    if *count > 0 {
                        metrics::record_retention_deletion(collection.as_str(), *count);
                    }
                }
                metrics::record_objects_deleted(result.objects_deleted);
                JobOutcome::Success
            }
            Err(e) => {
                tracing::error!(error = %e, "Retention run failed, changes rolled back");
                JobOutcome::Fail
            }
        };

        let outcome_label = if outcome.is_success() { "success" } else { "fail" };
        metrics::record_retention_run(outcome_label, started.elapsed().as_secs_f64());
        outcome
    }
}

/// Run a single retention pass inside one document-store transaction.
pub async fn run_retention(
    documents: &dyn DocumentStore,
    objects: &dyn ObjectStore,
    config: &RetentionConfig,
    now: DateTime<Utc>,
) -> RetentionResult<RetentionRunResult> {
    let mut session = documents.begin().await?;
    tracing::debug!(backend = documents.backend_name(), now = %now, "Retention transaction started");

    match run_stages(&mut *session, objects, config, now).await {
        Ok(result) => {
            session.commit().await?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = session.rollback().await {
                // The session is gone either way; the driver discards it.
                tracing::warn!(error = %rollback_err, "Explicit rollback failed");
            }
            Err(e)
        }
    }
}

async fn run_stages(
    session: &mut dyn DocumentSession,
    objects: &dyn ObjectStore,
    config: &RetentionConfig,
    now: DateTime<Utc>,
) -> RetentionResult<RetentionRunResult> {
    let catalog = RetentionCatalog::new(&config.periods, now);
    let mut registry = ProtectionRegistry::new();
    let mut result = RetentionRunResult::default();

    process_inactive_users(session, &catalog, &mut registry, &mut result).await?;
    process_temp_users(session, &catalog, &mut registry, &mut result).await?;
    run_global_sweep(session, &catalog, &registry, &mut result).await?;
    reap_images(
        session,
        objects,
        &catalog,
        &registry,
        &config.base_image_key,
        &mut result,
    )
    .await?;

    result.protected = registry.sizes();
    Ok(result)
}

/// Bulk delete and tally.
pub(super) async fn purge(
    session: &mut dyn DocumentSession,
    collection: Collection,
    filter: &Filter,
    result: &mut RetentionRunResult,
) -> DbResult<u64> {
    let deleted = session.delete_many(collection, filter).await?;
    if deleted > 0 {
        tracing::debug!(collection = %collection, deleted, filter = %filter, "Deleted documents");
    }
    result.record(collection, deleted);
    Ok(deleted)
}

/// Find and decode.
pub(super) async fn find_as<T: DeserializeOwned>(
    session: &mut dyn DocumentSession,
    collection: Collection,
    filter: &Filter,
) -> DbResult<Vec<T>> {
    session
        .find(collection, filter)
        .await?
        .into_iter()
        .map(|doc| {
            doc.decode().map_err(|source| DbError::Malformed {
                collection,
                id: doc.id.clone(),
                source,
            })
        })
        .collect()
}
