//! Fixtures shared by the end-to-end tests.

use std::{collections::BTreeSet, sync::Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{
    db::{Filter, sqlite::SqliteDocumentStore, tests::harness::create_sqlite_pool},
    models::{Collection, Document, fields},
    storage::{DeleteObjectsReport, ObjectDeleteFailure, ObjectStore, StorageError, StorageResult},
};

/// Object store double that records every batch it is asked to delete.
#[derive(Default)]
pub struct RecordingObjectStore {
    calls: Mutex<Vec<Vec<String>>>,
    refused_keys: BTreeSet<String>,
    unreachable: bool,
}

impl RecordingObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `keys` as per-key failures.
    pub fn refusing<I: IntoIterator<Item = &'static str>>(keys: I) -> Self {
        Self {
            refused_keys: keys.into_iter().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    /// Fail every request outright.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.calls().into_iter().flatten().collect()
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn delete_objects(&self, keys: &[String]) -> StorageResult<DeleteObjectsReport> {
        self.calls.lock().unwrap().push(keys.to_vec());
        if self.unreachable {
            return Err(StorageError::S3("connection refused".to_string()));
        }

        let (errors, deleted): (Vec<_>, Vec<_>) = keys
            .iter()
            .cloned()
            .partition(|key| self.refused_keys.contains(key));
        Ok(DeleteObjectsReport {
            deleted,
            errors: errors
                .into_iter()
                .map(|key| ObjectDeleteFailure {
                    key,
                    code: Some("AccessDenied".to_string()),
                    message: None,
                })
                .collect(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

/// In-memory document store with every collection table created.
pub struct Fixture {
    pub pool: SqlitePool,
    pub store: SqliteDocumentStore,
    pub now: DateTime<Utc>,
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = create_sqlite_pool().await;
        let store = SqliteDocumentStore::new(pool.clone());
        store.ensure_schema().await.unwrap();
        Self {
            pool,
            store,
            now: Utc::now(),
        }
    }

    pub fn days_ago(&self, days: i64) -> i64 {
        (self.now - Duration::days(days)).timestamp_millis()
    }

    pub fn hours_ago(&self, hours: i64) -> i64 {
        (self.now - Duration::hours(hours)).timestamp_millis()
    }

    pub async fn seed(&self, collection: Collection, id: &str, body: Value) {
        self.store
            .insert(collection, &Document::new(id, body))
            .await
            .unwrap();
    }

    pub async fn exists(&self, collection: Collection, id: &str) -> bool {
        self.store
            .count(collection, &Filter::is_in(fields::ID, [id]))
            .await
            .unwrap()
            == 1
    }

    pub async fn count(&self, collection: Collection) -> u64 {
        self.store.count(collection, &Filter::All).await.unwrap()
    }

    pub async fn temp_user(&self, id: &str, user_id: &str, created_days_ago: i64) {
        self.seed(
            Collection::TempUser,
            id,
            json!({ "userId": user_id, "createdAt": self.days_ago(created_days_ago) }),
        )
        .await;
    }

    /// A flagged record of `collection` owned by `user_id`, with extra fields.
    pub async fn flagged(
        &self,
        collection: Collection,
        id: &str,
        user_id: &str,
        updated_at: i64,
        extra: Value,
    ) {
        let flag = if matches!(collection, Collection::Follow | Collection::ShareLike) {
            fields::IS_CANCELED
        } else {
            fields::IS_DELETED
        };
        let mut body = json!({ "userId": user_id, "updatedAt": updated_at, flag: true });
        if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
            body.extend(extra);
        }
        self.seed(collection, id, body).await;
    }

    pub async fn image(&self, id: &str, owner_type: &str, type_id: &str, key: &str, deleted: bool) {
        self.seed(
            Collection::Image,
            id,
            json!({ "type": owner_type, "typeId": type_id, "imageKey": key, "isDeleted": deleted }),
        )
        .await;
    }
}
