//! Rendering of [`Filter`] trees into SQLite `WHERE` clauses.
//!
//! Documents live in a `body` JSON column; fields are read with
//! `json_extract`, except `_id` which maps to the `id` column. Set filters
//! bind a single JSON array and expand it with `json_each`, so the number of
//! bound parameters does not grow with the set.

use crate::{
    db::filter::{FieldValue, Filter},
    models::fields,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum SqlArg {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SqlFilter {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

pub(super) fn render(filter: &Filter) -> SqlFilter {
    let mut args = Vec::new();
    let sql = render_into(filter, &mut args);
    SqlFilter { sql, args }
}

fn column(field: &str) -> String {
    if field == fields::ID {
        "id".to_string()
    } else {
        format!("json_extract(body, '$.{}')", field)
    }
}

fn value_arg(value: &FieldValue) -> SqlArg {
    match value {
        // json_extract yields 1/0 for JSON booleans
        FieldValue::Bool(b) => SqlArg::Int(i64::from(*b)),
        FieldValue::Text(s) => SqlArg::Text(s.clone()),
        FieldValue::Time(t) => SqlArg::Int(t.timestamp_millis()),
    }
}

fn set_arg(ids: &std::collections::BTreeSet<String>) -> SqlArg {
    // Serializing a set of strings cannot fail
    SqlArg::Text(serde_json::Value::from_iter(ids.iter().cloned()).to_string())
}

fn render_into(filter: &Filter, args: &mut Vec<SqlArg>) -> String {
    match filter {
        Filter::All => "1 = 1".to_string(),
        Filter::Eq(field, value) => {
            args.push(value_arg(value));
            format!("{} = ?", column(field))
        }
        Filter::Ne(field, value) => {
            args.push(value_arg(value));
            format!("{} IS NOT ?", column(field))
        }
        Filter::Lt(field, value) => {
            args.push(value_arg(value));
            format!("{} < ?", column(field))
        }
        Filter::In(_, ids) if ids.is_empty() => "1 = 0".to_string(),
        Filter::In(field, ids) => {
            args.push(set_arg(ids));
            format!("{} IN (SELECT value FROM json_each(?))", column(field))
        }
        Filter::NotIn(_, ids) if ids.is_empty() => "1 = 1".to_string(),
        Filter::NotIn(field, ids) => {
            args.push(set_arg(ids));
            let col = column(field);
            format!(
                "({} IS NULL OR {} NOT IN (SELECT value FROM json_each(?)))",
                col, col
            )
        }
        Filter::And(parts) if parts.is_empty() => "1 = 1".to_string(),
        Filter::And(parts) => join(parts, " AND ", args),
        Filter::Or(parts) if parts.is_empty() => "1 = 0".to_string(),
        Filter::Or(parts) => join(parts, " OR ", args),
    }
}

fn join(parts: &[Filter], op: &str, args: &mut Vec<SqlArg>) -> String {
    let rendered: Vec<String> = parts.iter().map(|p| render_into(p, args)).collect();
    format!("({})", rendered.join(op))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_render_id_uses_column() {
        let rendered = render(&Filter::eq("_id", "abc"));
        assert_eq!(rendered.sql, "id = ?");
        assert_eq!(rendered.args, vec![SqlArg::Text("abc".into())]);
    }

    #[test]
    fn test_render_bool_and_time() {
        let at = Utc.timestamp_millis_opt(1_000).unwrap();
        let rendered = render(&Filter::eq("isDeleted", true).and(Filter::lt("updatedAt", at)));
        assert_eq!(
            rendered.sql,
            "(json_extract(body, '$.isDeleted') = ? AND json_extract(body, '$.updatedAt') < ?)"
        );
        assert_eq!(rendered.args, vec![SqlArg::Int(1), SqlArg::Int(1_000)]);
    }

    #[test]
    fn test_render_not_in_binds_one_json_array() {
        let rendered = render(&Filter::not_in("postId", ["p2", "p1"]));
        assert_eq!(
            rendered.sql,
            "(json_extract(body, '$.postId') IS NULL OR json_extract(body, '$.postId') NOT IN (SELECT value FROM json_each(?)))"
        );
        assert_eq!(rendered.args, vec![SqlArg::Text(r#"["p1","p2"]"#.into())]);
    }

    #[test]
    fn test_render_empty_sets() {
        assert_eq!(render(&Filter::is_in("_id", Vec::<String>::new())).sql, "1 = 0");
        assert_eq!(render(&Filter::not_in("_id", Vec::<String>::new())).sql, "1 = 1");
        assert!(render(&Filter::not_in("_id", Vec::<String>::new())).args.is_empty());
    }

    #[test]
    fn test_render_ne_is_null_safe() {
        let rendered = render(&Filter::ne("joinProgress", "DONE"));
        assert_eq!(rendered.sql, "json_extract(body, '$.joinProgress') IS NOT ?");
    }

    #[test]
    fn test_render_or() {
        let rendered = render(&Filter::eq("follower", "u").or(Filter::eq("following", "u")));
        assert_eq!(
            rendered.sql,
            "(json_extract(body, '$.follower') = ? OR json_extract(body, '$.following') = ?)"
        );
        assert_eq!(rendered.args.len(), 2);
    }
}
