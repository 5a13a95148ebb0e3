//! Typed document filters.
//!
//! A [`Filter`] is a tree of field comparisons, set-membership tests and
//! boolean combinators. It knows nothing about any storage driver; backends
//! render it into their own query language.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

/// A scalar a document field can be compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
    Time(DateTime<Utc>),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Time(value)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Time(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

/// Predicate over the documents of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Matches every document.
    All,
    Eq(&'static str, FieldValue),
    /// Also matches documents where the field is absent.
    Ne(&'static str, FieldValue),
    Lt(&'static str, FieldValue),
    In(&'static str, BTreeSet<String>),
    /// Also matches documents where the field is absent.
    NotIn(&'static str, BTreeSet<String>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<FieldValue>) -> Self {
        Self::Eq(field, value.into())
    }

    pub fn ne(field: &'static str, value: impl Into<FieldValue>) -> Self {
        Self::Ne(field, value.into())
    }

    pub fn lt(field: &'static str, value: impl Into<FieldValue>) -> Self {
        Self::Lt(field, value.into())
    }

    pub fn is_in<I, S>(field: &'static str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In(field, ids.into_iter().map(Into::into).collect())
    }

    pub fn not_in<I, S>(field: &'static str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NotIn(field, ids.into_iter().map(Into::into).collect())
    }

    /// Conjunction of `filters`. Nested conjunctions are flattened and
    /// `All` operands dropped.
    pub fn all_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Self::All => {}
                Self::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Self::All,
            1 => parts.remove(0),
            _ => Self::And(parts),
        }
    }

    /// Disjunction of `filters`. Nested disjunctions are flattened; an `All`
    /// operand makes the whole disjunction `All`.
    pub fn any_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Self::All => return Self::All,
                Self::Or(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            1 => parts.remove(0),
            _ => Self::Or(parts),
        }
    }

    pub fn and(self, other: Filter) -> Self {
        Self::all_of([self, other])
    }

    pub fn or(self, other: Filter) -> Self {
        Self::any_of([self, other])
    }

    /// True when the filter can never match (an empty `In`, or an empty `Or`).
    pub fn is_unsatisfiable(&self) -> bool {
        match self {
            Self::In(_, ids) => ids.is_empty(),
            Self::Or(parts) => parts.iter().all(Filter::is_unsatisfiable),
            Self::And(parts) => parts.iter().any(Filter::is_unsatisfiable),
            _ => false,
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut std::fmt::Formatter<'_>, parts: &[Filter], op: &str) -> std::fmt::Result {
            write!(f, "(")?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", part)?;
            }
            write!(f, ")")
        }

        match self {
            Self::All => write!(f, "*"),
            Self::Eq(field, v) => write!(f, "{} = {}", field, v),
            Self::Ne(field, v) => write!(f, "{} != {}", field, v),
            Self::Lt(field, v) => write!(f, "{} < {}", field, v),
            Self::In(field, ids) => write!(f, "{} IN [{} ids]", field, ids.len()),
            Self::NotIn(field, ids) => write!(f, "{} NOT IN [{} ids]", field, ids.len()),
            Self::And(parts) => join(f, parts, "AND"),
            Self::Or(parts) => join(f, parts, "OR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_all_of_flattens_and_drops_all() {
        let filter = Filter::all_of([
            Filter::All,
            Filter::eq("isDeleted", true).and(Filter::eq("userId", "u1")),
            Filter::lt("updatedAt", Utc.timestamp_opt(0, 0).unwrap()),
        ]);
        match filter {
            Filter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected conjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_all_of_single_operand_unwraps() {
        assert_eq!(
            Filter::all_of([Filter::All, Filter::eq("isDeleted", true)]),
            Filter::eq("isDeleted", true)
        );
        assert_eq!(Filter::all_of([]), Filter::All);
    }

    #[test]
    fn test_any_of_absorbs_all() {
        assert_eq!(
            Filter::any_of([Filter::eq("a", true), Filter::All]),
            Filter::All
        );
    }

    #[test]
    fn test_set_filters_deduplicate_ids() {
        let filter = Filter::not_in("_id", ["b", "a", "b"]);
        match filter {
            Filter::NotIn(_, ids) => {
                assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["a", "b"])
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unsatisfiable() {
        assert!(Filter::is_in("_id", Vec::<String>::new()).is_unsatisfiable());
        assert!(!Filter::not_in("_id", Vec::<String>::new()).is_unsatisfiable());
        assert!(
            Filter::eq("isDeleted", true)
                .and(Filter::is_in("_id", Vec::<String>::new()))
                .is_unsatisfiable()
        );
        assert!(!Filter::All.is_unsatisfiable());
    }

    #[test]
    fn test_display_is_readable() {
        let filter = Filter::eq("isDeleted", true)
            .and(Filter::not_in("_id", ["x", "y"]))
            .and(Filter::eq("postId", "p").or(Filter::ne("type", "profile")));
        assert_eq!(
            filter.to_string(),
            "(isDeleted = true AND _id NOT IN [2 ids] AND (postId = \"p\" OR type != \"profile\"))"
        );
    }
}
