use serde::{Deserialize, Serialize};

/// A named document collection in the diary store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    User,
    TempUser,
    Social,
    NotificationLog,
    Follow,
    DiaryEntity,
    DiaryCalendar,
    DiaryWeight,
    SharePost,
    ShareComment,
    ShareCommentReply,
    ShareLike,
    Image,
}

impl Collection {
    /// Every collection the janitor knows about, in schema order.
    pub const ALL: [Collection; 13] = [
        Collection::TempUser,
        Collection::User,
        Collection::Social,
        Collection::NotificationLog,
        Collection::Follow,
        Collection::DiaryEntity,
        Collection::DiaryCalendar,
        Collection::DiaryWeight,
        Collection::ShareCommentReply,
        Collection::ShareComment,
        Collection::ShareLike,
        Collection::SharePost,
        Collection::Image,
    ];

    /// Storage name of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::TempUser => "temp_user",
            Self::Social => "social",
            Self::NotificationLog => "notification_log",
            Self::Follow => "follow",
            Self::DiaryEntity => "diary_entity",
            Self::DiaryCalendar => "diary_calendar",
            Self::DiaryWeight => "diary_weight",
            Self::SharePost => "share_post",
            Self::ShareComment => "share_comment",
            Self::ShareCommentReply => "share_comment_reply",
            Self::ShareLike => "share_like",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown collection: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_collections_are_distinct() {
        let mut names: Vec<_> = Collection::ALL.iter().map(|c| c.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 13);
    }

    #[test]
    fn test_collection_from_str_round_trips_storage_name() {
        for collection in Collection::ALL {
            assert_eq!(collection.as_str().parse::<Collection>(), Ok(collection));
        }
        assert!("share_comments".parse::<Collection>().is_err());
    }
}
