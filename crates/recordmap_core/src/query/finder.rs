//! Convention-based finders: `find_by_<field>` and `count_by_<field>`.
//!
//! # Responsibility
//! - Parse finder call names into a kind and a field.
//! - Build the WHERE fragment and parameters matching one field.
//!
//! # Invariants
//! - Call names are case sensitive.
//! - A list argument binds one placeholder per value.

use crate::db::Statement;
use crate::mapper::error::{MapperError, MapperResult};
use crate::model::value::Value;
use crate::schema::quote::IdentifierQuoter;
use once_cell::sync::Lazy;
use regex::Regex;

static FINDER_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(find|count)_by_([A-Za-z_][A-Za-z0-9_]*)$").expect("valid finder name regex")
});

/// What a finder returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderKind {
    /// `find_by_*`: all matching records.
    Find,
    /// `count_by_*`: number of matching rows.
    Count,
}

/// A parsed finder call name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderCall {
    pub kind: FinderKind,
    pub field: String,
}

impl FinderCall {
    /// Parses `find_by_<field>` or `count_by_<field>`.
    ///
    /// # Errors
    /// - `NoSuchMethod` naming the call for anything else.
    pub fn parse(name: &str) -> MapperResult<Self> {
        let captures = FINDER_NAME_RE
            .captures(name)
            .ok_or_else(|| MapperError::NoSuchMethod(name.to_string()))?;

        let kind = match &captures[1] {
            "find" => FinderKind::Find,
            _ => FinderKind::Count,
        };
        Ok(Self {
            kind,
            field: captures[2].to_string(),
        })
    }
}

/// Argument of a finder call: one value or a list of values.
#[derive(Debug, Clone, PartialEq)]
pub enum FinderArg {
    Scalar(Value),
    List(Vec<Value>),
}

impl From<Value> for FinderArg {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<i64> for FinderArg {
    fn from(value: i64) -> Self {
        Self::Scalar(Value::Integer(value))
    }
}

impl From<&str> for FinderArg {
    fn from(value: &str) -> Self {
        Self::Scalar(Value::from(value))
    }
}

impl From<String> for FinderArg {
    fn from(value: String) -> Self {
        Self::Scalar(Value::Text(value))
    }
}

impl From<Vec<Value>> for FinderArg {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl FinderArg {
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Builds `<field> = ?` with the value as its parameter.
pub fn where_equal(quoter: &IdentifierQuoter, field: &str, value: Value) -> Statement {
    Statement::new(format!("{} = ?", quoter.quote(field)), vec![value])
}

/// Builds `<field> IN (?, ?, ...)` with one parameter per value.
///
/// An empty list yields a fragment that matches no rows.
pub fn where_in(quoter: &IdentifierQuoter, field: &str, values: Vec<Value>) -> Statement {
    if values.is_empty() {
        return Statement::new("1 = 0", Vec::new());
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    Statement::new(
        format!("{} IN ({placeholders})", quoter.quote(field)),
        values,
    )
}

/// Builds the WHERE fragment matching `field` against `arg`.
pub fn match_fragment(quoter: &IdentifierQuoter, field: &str, arg: FinderArg) -> Statement {
    match arg {
        FinderArg::Scalar(value) => where_equal(quoter, field, value),
        FinderArg::List(values) => where_in(quoter, field, values),
    }
}

#[cfg(test)]
mod tests {
    use super::{match_fragment, FinderArg, FinderCall, FinderKind};
    use crate::mapper::error::MapperError;
    use crate::model::value::Value;
    use crate::schema::quote::IdentifierQuoter;

    #[test]
    fn parses_find_and_count_names() {
        let find = FinderCall::parse("find_by_name").unwrap();
        assert_eq!(find.kind, FinderKind::Find);
        assert_eq!(find.field, "name");

        let count = FinderCall::parse("count_by_created_at").unwrap();
        assert_eq!(count.kind, FinderKind::Count);
        assert_eq!(count.field, "created_at");
    }

    #[test]
    fn rejects_unknown_call_names() {
        for name in ["fetch_by_name", "find_by_", "Find_by_name", "count_by_na-me"] {
            let err = FinderCall::parse(name).unwrap_err();
            assert!(
                matches!(&err, MapperError::NoSuchMethod(call) if call == name),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn scalar_argument_builds_equality() {
        let quoter = IdentifierQuoter::for_dialect_name("mysql");
        let fragment = match_fragment(&quoter, "name", FinderArg::from("Books"));
        assert_eq!(fragment.sql, "`name` = ?");
        assert_eq!(fragment.params, vec![Value::from("Books")]);
    }

    #[test]
    fn list_argument_binds_one_placeholder_per_value() {
        let quoter = IdentifierQuoter::for_dialect_name("mysql");
        let fragment = match_fragment(&quoter, "name", FinderArg::list(["Books", "Games"]));
        assert_eq!(fragment.sql, "`name` IN (?, ?)");
        assert_eq!(
            fragment.params,
            vec![Value::from("Books"), Value::from("Games")]
        );

        let empty = match_fragment(&quoter, "name", FinderArg::List(Vec::new()));
        assert_eq!(empty.sql, "1 = 0");
        assert!(empty.params.is_empty());
    }
}
