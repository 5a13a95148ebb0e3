//! Per-run protection sets.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::db::Filter;

/// Identifier categories that may be shielded from the global sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectedCategory {
    /// Diary entity `_id`s still owned by a temporary user.
    Entity,
    /// Share post `_id`s still owned by a temporary user.
    Post,
    /// Temporary user ids.
    User,
    Follow,
    Comment,
    CommentReply,
    /// Users whose onboarding expired. Their data is removed unconditionally.
    Inactive,
}

impl ProtectedCategory {
    pub const ALL: [ProtectedCategory; 7] = [
        ProtectedCategory::Entity,
        ProtectedCategory::Post,
        ProtectedCategory::User,
        ProtectedCategory::Follow,
        ProtectedCategory::Comment,
        ProtectedCategory::CommentReply,
        ProtectedCategory::Inactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Post => "post",
            Self::User => "user",
            Self::Follow => "follow",
            Self::Comment => "comment",
            Self::CommentReply => "comment_reply",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for ProtectedCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers that must survive the current run, grouped by category.
///
/// A registry is created empty for every run and dropped with it. It is
/// only ever turned into exclusion filters; it never walks candidate records.
#[derive(Debug, Default)]
pub struct ProtectionRegistry {
    sets: BTreeMap<ProtectedCategory, BTreeSet<String>>,
}

impl ProtectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `ids` to `category`. Adding an id twice is a no-op.
    pub fn protect<I, S>(&mut self, category: ProtectedCategory, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets
            .entry(category)
            .or_default()
            .extend(ids.into_iter().map(Into::into));
    }

    pub fn is_protected(&self, category: ProtectedCategory, id: &str) -> bool {
        self.sets.get(&category).is_some_and(|set| set.contains(id))
    }

    pub fn ids(&self, category: ProtectedCategory) -> impl Iterator<Item = &str> {
        self.sets
            .get(&category)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn len(&self, category: ProtectedCategory) -> usize {
        self.sets.get(&category).map_or(0, BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(BTreeSet::is_empty)
    }

    /// Sizes of every category, including empty ones.
    pub fn sizes(&self) -> BTreeMap<ProtectedCategory, usize> {
        ProtectedCategory::ALL
            .iter()
            .map(|category| (*category, self.len(*category)))
            .collect()
    }

    /// `field NOT IN <category>`. Documents missing `field` also match.
    pub fn exclude(&self, field: &'static str, category: ProtectedCategory) -> Filter {
        Filter::not_in(field, self.ids(category))
    }

    /// `field IN <category>`.
    pub fn include(&self, field: &'static str, category: ProtectedCategory) -> Filter {
        Filter::is_in(field, self.ids(category))
    }
}
