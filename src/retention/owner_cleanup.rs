//! Owner-scoped cleanup: users whose onboarding expired, and temporary users.

use tracing::{debug, info};

use super::{
    RetentionResult, RetentionRunResult,
    catalog::RetentionCatalog,
    guard::{ProtectedCategory, ProtectionRegistry},
    worker::{find_as, purge},
};
use crate::{
    db::{DocumentSession, Filter},
    models::{Collection, ImageOwner, SocialOnboarding, TemporaryUser, fields},
};

/// Collections whose flagged records are purged per temporary user when they
/// predate the temporary user itself.
const OWNER_SCOPED: [Collection; 6] = [
    Collection::DiaryEntity,
    Collection::Follow,
    Collection::SharePost,
    Collection::ShareComment,
    Collection::ShareCommentReply,
    Collection::ShareLike,
];

/// Flagged records that survive the owner pass are shielded from the global
/// sweep under these categories. Likes have no dependents and are not tracked.
const OWNER_PROTECTED: [(Collection, ProtectedCategory); 5] = [
    (Collection::DiaryEntity, ProtectedCategory::Entity),
    (Collection::Follow, ProtectedCategory::Follow),
    (Collection::SharePost, ProtectedCategory::Post),
    (Collection::ShareComment, ProtectedCategory::Comment),
    (Collection::ShareCommentReply, ProtectedCategory::CommentReply),
];

/// Purge users whose social onboarding never finished.
///
/// The stale onboarding records are removed first; their owners then land in
/// the `inactive` set and lose their user record and profile images.
#[tracing::instrument(skip_all)]
pub async fn process_inactive_users(
    session: &mut dyn DocumentSession,
    catalog: &RetentionCatalog,
    registry: &mut ProtectionRegistry,
    result: &mut RetentionRunResult,
) -> RetentionResult<()> {
    let filter = catalog.inactive_onboarding();
    let onboardings: Vec<SocialOnboarding> = find_as(session, Collection::Social, &filter).await?;
    purge(session, Collection::Social, &filter, result).await?;

    if onboardings.is_empty() {
        debug!("No inactive onboarding records");
        return Ok(());
    }

    registry.protect(
        ProtectedCategory::Inactive,
        onboardings.into_iter().map(|onboarding| onboarding.user_id),
    );

    let users = purge(
        session,
        Collection::User,
        &registry.include(fields::ID, ProtectedCategory::Inactive),
        result,
    )
    .await?;
    let images = purge(
        session,
        Collection::Image,
        &Filter::eq(fields::TYPE, ImageOwner::PROFILE_TAG)
            .and(registry.include(fields::TYPE_ID, ProtectedCategory::Inactive)),
        result,
    )
    .await?;

    info!(
        inactive = registry.len(ProtectedCategory::Inactive),
        users_deleted = users,
        profile_images_deleted = images,
        "Purged inactive users"
    );
    Ok(())
}

/// Expire old temporary users, then shield what the remaining ones still own.
#[tracing::instrument(skip_all)]
pub async fn process_temp_users(
    session: &mut dyn DocumentSession,
    catalog: &RetentionCatalog,
    registry: &mut ProtectionRegistry,
    result: &mut RetentionRunResult,
) -> RetentionResult<()> {
    let expired = purge(
        session,
        Collection::TempUser,
        &catalog.expired_temp_users(),
        result,
    )
    .await?;

    let temp_users: Vec<TemporaryUser> =
        find_as(session, Collection::TempUser, &Filter::All).await?;

    for user in &temp_users {
        protect_temp_user(session, catalog, registry, result, user).await?;
    }

    info!(
        expired,
        remaining = temp_users.len(),
        protected_entities = registry.len(ProtectedCategory::Entity),
        protected_posts = registry.len(ProtectedCategory::Post),
        protected_comments = registry.len(ProtectedCategory::Comment),
        "Processed temporary users"
    );
    Ok(())
}

#[tracing::instrument(skip(session, catalog, registry, result, user), fields(user_id = %user.user_id))]
async fn protect_temp_user(
    session: &mut dyn DocumentSession,
    catalog: &RetentionCatalog,
    registry: &mut ProtectionRegistry,
    result: &mut RetentionRunResult,
    user: &TemporaryUser,
) -> RetentionResult<()> {
    let owner = user.user_id.as_str();
    registry.protect(ProtectedCategory::User, [owner]);

    for collection in OWNER_SCOPED {
        purge(
            session,
            collection,
            &catalog.owned_stale(collection, owner, user.created_at),
            result,
        )
        .await?;
    }

    // Everything still flagged was touched after the owner appeared.
    for (collection, category) in OWNER_PROTECTED {
        let survivors = session
            .find(collection, &catalog.owned_flagged(collection, owner))
            .await?;
        if !survivors.is_empty() {
            debug!(collection = %collection, count = survivors.len(), category = %category, "Protecting flagged records");
        }
        registry.protect(category, survivors.into_iter().map(|doc| doc.id));
    }

    Ok(())
}
