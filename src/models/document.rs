use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

/// Field names shared by the diary collections.
pub mod fields {
    /// Implicit unique identifier of every document.
    pub const ID: &str = "_id";
    pub const USER_ID: &str = "userId";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const IS_DELETED: &str = "isDeleted";
    pub const IS_CANCELED: &str = "isCanceled";
    pub const JOIN_PROGRESS: &str = "joinProgress";
    pub const ENTITY_ID: &str = "entityId";
    pub const POST_ID: &str = "postId";
    pub const COMMENT_ID: &str = "commentId";
    pub const FOLLOWER: &str = "follower";
    pub const FOLLOWING: &str = "following";
    pub const TYPE: &str = "type";
    pub const TYPE_ID: &str = "typeId";
    pub const IMAGE_KEY: &str = "imageKey";
}

/// Terminal `joinProgress` value of a finished onboarding.
pub const JOIN_PROGRESS_DONE: &str = "DONE";

/// A raw document as returned by the document store.
///
/// The identifier is kept apart from the body; the body never contains `_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: JsonValue,
}

impl Document {
    pub fn new(id: impl Into<String>, body: JsonValue) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    /// Decode the body into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// A user that has not completed onboarding yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryUser {
    pub user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Social onboarding progress of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialOnboarding {
    pub user_id: String,
    #[serde(default)]
    pub join_progress: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_temporary_user() {
        let doc = Document::new(
            "t1",
            json!({ "userId": "u1", "createdAt": 1_700_000_000_000_i64 }),
        );
        let user: TemporaryUser = doc.decode().unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(
            user.created_at,
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
        );
    }

    #[test]
    fn test_social_onboarding_missing_progress_decodes() {
        let doc = Document::new("s1", json!({ "userId": "u1", "createdAt": 0 }));
        let social: SocialOnboarding = doc.decode().unwrap();
        assert_eq!(social.join_progress, None);

        let done = Document::new(
            "s2",
            json!({ "userId": "u1", "joinProgress": "DONE", "createdAt": 0 }),
        );
        assert_eq!(
            done.decode::<SocialOnboarding>().unwrap().join_progress.as_deref(),
            Some(JOIN_PROGRESS_DONE)
        );
    }

    #[test]
    fn test_decode_missing_field_is_error() {
        let doc = Document::new("t1", json!({ "createdAt": 0 }));
        assert!(doc.decode::<TemporaryUser>().is_err());
    }
}
