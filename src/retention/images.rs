//! Image reaper: flagged image records and their stored objects.

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::{
    RetentionResult, RetentionRunResult,
    catalog::RetentionCatalog,
    guard::{ProtectedCategory, ProtectionRegistry},
    worker::{find_as, purge},
};
use crate::{
    db::{DocumentSession, Filter},
    models::{Collection, ImageRecord, fields},
    storage::ObjectStore,
};

/// Flagged images whose owner is not protected as an entity, post or user.
pub fn reapable_images(catalog: &RetentionCatalog, registry: &ProtectionRegistry) -> Filter {
    Filter::all_of([
        catalog.flagged(Collection::Image),
        registry.exclude(fields::TYPE_ID, ProtectedCategory::Entity),
        registry.exclude(fields::TYPE_ID, ProtectedCategory::Post),
        registry.exclude(fields::TYPE_ID, ProtectedCategory::User),
    ])
}

/// Distinct object keys of `records`, in first-seen order, never including
/// `base_image_key`. Records without a key contribute nothing.
pub fn object_keys(records: &[ImageRecord], base_image_key: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    records
        .iter()
        .filter_map(|record| record.image_key.as_deref())
        .filter(|key| !key.is_empty() && *key != base_image_key)
        .filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}

/// Delete reapable image records, then their objects.
///
/// The object store is only called when at least one key is left after
/// removing the base image key. Any key it refuses fails the run.
#[tracing::instrument(skip_all)]
pub async fn reap_images(
    session: &mut dyn DocumentSession,
    objects: &dyn ObjectStore,
    catalog: &RetentionCatalog,
    registry: &ProtectionRegistry,
    base_image_key: &str,
    result: &mut RetentionRunResult,
) -> RetentionResult<()> {
    let filter = reapable_images(catalog, registry);
    let records: Vec<ImageRecord> = find_as(session, Collection::Image, &filter).await?;
    let deleted = purge(session, Collection::Image, &filter, result).await?;

    for record in &records {
        debug!(owner = ?record.owner(), key = ?record.image_key, "Reaping image");
    }

    let keys = object_keys(&records, base_image_key);
    if keys.is_empty() {
        info!(records_deleted = deleted, "No image objects to delete");
        return Ok(());
    }

    let report = objects.delete_objects(&keys).await?;
    let removed = report.ensure_complete()?;
    result.objects_deleted += removed as u64;

    info!(
        records_deleted = deleted,
        objects_deleted = removed,
        backend = objects.backend_name(),
        "Reaped images"
    );
    Ok(())
}
