//! Parameterized SQL construction for one table.
//!
//! # Responsibility
//! - Compose COUNT/SELECT/INSERT/UPDATE/DELETE statements.
//! - Render a record's field state as a SET fragment.
//!
//! # Invariants
//! - Builders never execute anything.
//! - WHERE fragments are trusted caller SQL and are not parsed; every value
//!   must travel through the parameter list.
//! - Falsy field values are written as `NULL`; null fields are omitted.

use crate::db::Statement;
use crate::model::fields::FieldStore;
use crate::model::value::Value;
use crate::schema::quote::IdentifierQuoter;

/// `<quoted column> = <literal>` pairs for INSERT/UPDATE.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetFragment {
    assignments: Vec<(String, String)>,
}

impl SetFragment {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Renders `a = x, b = y`.
    pub fn to_sql(&self) -> String {
        self.assignments
            .iter()
            .map(|(column, literal)| format!("{column} = {literal}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn columns_sql(&self) -> String {
        self.assignments
            .iter()
            .map(|(column, _)| column.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn values_sql(&self) -> String {
        self.assignments
            .iter()
            .map(|(_, literal)| literal.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Statement builder bound to one table and dialect.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    quoter: &'a IdentifierQuoter,
    table: &'a str,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(quoter: &'a IdentifierQuoter, table: &'a str) -> Self {
        Self { quoter, table }
    }

    /// `SELECT COUNT(*) FROM <table> [WHERE <fragment>]`
    pub fn build_count(&self, where_fragment: &str, params: Vec<Value>) -> Statement {
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            self.quoted_table(),
            where_clause(where_fragment)
        );
        Statement::new(sql, params)
    }

    /// `SELECT * FROM <table> [WHERE <fragment>] [LIMIT 1]`
    pub fn build_select(
        &self,
        where_fragment: &str,
        params: Vec<Value>,
        limit_one: bool,
    ) -> Statement {
        let mut sql = format!(
            "SELECT * FROM {}{}",
            self.quoted_table(),
            where_clause(where_fragment)
        );
        if limit_one {
            sql.push_str(" LIMIT 1");
        }
        Statement::new(sql, params)
    }

    /// INSERT carrying the fragment's columns.
    ///
    /// MySQL-like dialects get `INSERT INTO <table> SET <fragment>`; others
    /// get the same assignments as a column list and `VALUES`.
    pub fn build_insert(&self, set: &SetFragment) -> Statement {
        let sql = if self.quoter.dialect().supports_insert_set() {
            format!("INSERT INTO {} SET {}", self.quoted_table(), set.to_sql())
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.quoted_table(),
                set.columns_sql(),
                set.values_sql()
            )
        };
        Statement::new(sql, Vec::new())
    }

    /// `UPDATE <table> SET <fragment> WHERE <pk> = ? [LIMIT 1]`
    pub fn build_update(&self, set: &SetFragment, pk_column: &str, pk_value: Value) -> Statement {
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            self.quoted_table(),
            set.to_sql(),
            self.quoter.quote(pk_column),
            self.write_limit()
        );
        Statement::new(sql, vec![pk_value])
    }

    /// `DELETE FROM <table> WHERE <pk> = ? [LIMIT 1]`
    pub fn build_delete(&self, pk_column: &str, pk_value: Value) -> Statement {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?{}",
            self.quoted_table(),
            self.quoter.quote(pk_column),
            self.write_limit()
        );
        Statement::new(sql, vec![pk_value])
    }

    /// Renders non-null fields as assignments, optionally skipping the
    /// primary key.
    ///
    /// Falsy values (`""`, `"0"`, `0`, ...) become `NULL`; other values are
    /// rendered with `quote_literal`. Null fields are left out entirely.
    pub fn build_set_fragment(
        &self,
        fields: &FieldStore,
        pk_column: &str,
        exclude_pk: bool,
        quote_literal: impl Fn(&Value) -> String,
    ) -> SetFragment {
        let assignments = fields
            .iter()
            .filter(|(column, _)| !(exclude_pk && *column == pk_column))
            .filter(|(_, value)| !value.is_null())
            .map(|(column, value)| {
                let literal = if value.is_falsy() {
                    "NULL".to_string()
                } else {
                    quote_literal(value)
                };
                (self.quoter.quote(column), literal)
            })
            .collect();
        SetFragment { assignments }
    }

    fn quoted_table(&self) -> String {
        self.quoter.quote(self.table)
    }

    fn write_limit(&self) -> &'static str {
        if self.quoter.dialect().supports_write_limit() {
            " LIMIT 1"
        } else {
            ""
        }
    }
}

fn where_clause(fragment: &str) -> String {
    if fragment.trim().is_empty() {
        String::new()
    } else {
        format!(" WHERE {fragment}")
    }
}
