//! Global cascade sweep over every dependent collection.

use tracing::info;

use super::{
    RetentionResult, RetentionRunResult,
    catalog::RetentionCatalog,
    guard::{ProtectedCategory, ProtectionRegistry},
    worker::purge,
};
use crate::{
    db::{DocumentSession, Filter},
    models::{Collection, fields},
};

/// Bulk deletes of the sweep, in execution order.
///
/// Children are excluded both by their own protected ids and by their
/// protected parents, so nothing a temporary user still needs goes away.
pub fn sweep_plan(
    catalog: &RetentionCatalog,
    registry: &ProtectionRegistry,
) -> Vec<(Collection, Filter)> {
    use ProtectedCategory as P;

    let flagged = |collection: Collection, exclusions: Vec<Filter>| {
        (
            collection,
            Filter::all_of(std::iter::once(catalog.flagged(collection)).chain(exclusions)),
        )
    };

    vec![
        (
            Collection::NotificationLog,
            catalog.expired_notification_logs(),
        ),
        flagged(
            Collection::DiaryEntity,
            vec![registry.exclude(fields::ID, P::Entity)],
        ),
        flagged(
            Collection::DiaryCalendar,
            vec![registry.exclude(fields::ENTITY_ID, P::Entity)],
        ),
        flagged(
            Collection::DiaryWeight,
            vec![registry.exclude(fields::ENTITY_ID, P::Entity)],
        ),
        flagged(
            Collection::Follow,
            vec![registry.exclude(fields::ID, P::Follow)],
        ),
        flagged(
            Collection::SharePost,
            vec![registry.exclude(fields::ID, P::Post)],
        ),
        flagged(
            Collection::ShareComment,
            vec![
                registry.exclude(fields::ID, P::Comment),
                registry.exclude(fields::POST_ID, P::Post),
            ],
        ),
        flagged(
            Collection::ShareCommentReply,
            vec![
                registry.exclude(fields::ID, P::CommentReply),
                registry.exclude(fields::COMMENT_ID, P::Comment),
            ],
        ),
        flagged(
            Collection::ShareLike,
            vec![registry.exclude(fields::POST_ID, P::Post)],
        ),
    ]
}

/// Run every step of [`sweep_plan`] as a bulk delete. Nothing is read back.
#[tracing::instrument(skip_all)]
pub async fn run_global_sweep(
    session: &mut dyn DocumentSession,
    catalog: &RetentionCatalog,
    registry: &ProtectionRegistry,
    result: &mut RetentionRunResult,
) -> RetentionResult<()> {
    let mut swept = 0;
    for (collection, filter) in sweep_plan(catalog, registry) {
        swept += purge(session, collection, &filter, result).await?;
    }

    info!(deleted = swept, "Global sweep complete");
    Ok(())
}
