//! Deletion-candidate predicates, one per collection.
//!
//! Every predicate is computed against a single `now` captured when the
//! catalog is built, so all stages of a run agree on the cutoffs.

use chrono::{DateTime, Utc};

use crate::{
    config::RetentionPeriods,
    db::Filter,
    models::{Collection, JOIN_PROGRESS_DONE, fields},
};

#[derive(Debug, Clone)]
pub struct RetentionCatalog {
    inactive_onboarding_cutoff: DateTime<Utc>,
    temp_user_cutoff: DateTime<Utc>,
    notification_log_cutoff: DateTime<Utc>,
}

impl RetentionCatalog {
    pub fn new(periods: &RetentionPeriods, now: DateTime<Utc>) -> Self {
        Self {
            inactive_onboarding_cutoff: now - periods.inactive_onboarding(),
            temp_user_cutoff: now - periods.temp_user(),
            notification_log_cutoff: now - periods.notification_log(),
        }
    }

    /// Onboarding records that never reached `DONE` within the window.
    pub fn inactive_onboarding(&self) -> Filter {
        Filter::ne(fields::JOIN_PROGRESS, JOIN_PROGRESS_DONE)
            .and(Filter::lt(fields::CREATED_AT, self.inactive_onboarding_cutoff))
    }

    pub fn expired_temp_users(&self) -> Filter {
        Filter::lt(fields::CREATED_AT, self.temp_user_cutoff)
    }

    pub fn expired_notification_logs(&self) -> Filter {
        Filter::lt(fields::CREATED_AT, self.notification_log_cutoff)
    }

    /// Soft-delete flag of a collection, if it has one.
    pub fn flag_field(collection: Collection) -> Option<&'static str> {
        match collection {
            Collection::Follow | Collection::ShareLike => Some(fields::IS_CANCELED),
            Collection::DiaryEntity
            | Collection::DiaryCalendar
            | Collection::DiaryWeight
            | Collection::SharePost
            | Collection::ShareComment
            | Collection::ShareCommentReply
            | Collection::Image => Some(fields::IS_DELETED),
            Collection::User
            | Collection::TempUser
            | Collection::Social
            | Collection::NotificationLog => None,
        }
    }

    /// `flag == true`. Never matches for a collection without a flag.
    pub fn flagged(&self, collection: Collection) -> Filter {
        match Self::flag_field(collection) {
            Some(flag) => Filter::eq(flag, true),
            None => Filter::any_of([]),
        }
    }

    /// Records belonging to `owner`. A follow belongs to both of its ends.
    pub fn owned(&self, collection: Collection, owner: &str) -> Filter {
        match collection {
            Collection::Follow => Filter::eq(fields::FOLLOWER, owner)
                .or(Filter::eq(fields::FOLLOWING, owner)),
            _ => Filter::eq(fields::USER_ID, owner),
        }
    }

    pub fn owned_flagged(&self, collection: Collection, owner: &str) -> Filter {
        self.flagged(collection).and(self.owned(collection, owner))
    }

    /// Flagged records of `owner` last touched before the owner was created.
    pub fn owned_stale(
        &self,
        collection: Collection,
        owner: &str,
        owner_created_at: DateTime<Utc>,
    ) -> Filter {
        self.owned_flagged(collection, owner)
            .and(Filter::lt(fields::UPDATED_AT, owner_created_at))
    }
}
