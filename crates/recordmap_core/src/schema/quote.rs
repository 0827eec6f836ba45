//! Dialect detection and identifier quoting.
//!
//! # Responsibility
//! - Map a driver's dialect name to the SQL flavor the builder targets.
//! - Wrap table/column identifiers in the dialect quote character.
//!
//! # Invariants
//! - Identifiers are trusted schema names. Embedded quote characters are not
//!   escaped, so identifiers must never come from untrusted input.
//! - The wildcard `*` is never quoted.

/// SQL flavor derived from a connection's dialect name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
    Postgres,
    MsSql,
    /// Unrecognized driver, treated as MySQL-like.
    Other(String),
}

impl Dialect {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Self::Postgres,
            "sqlsrv" | "dblib" | "mssql" | "sybase" => Self::MsSql,
            "mysql" => Self::MySql,
            "sqlite" | "sqlite2" | "sqlite3" => Self::Sqlite,
            _ => Self::Other(name.to_string()),
        }
    }

    /// Character used to wrap identifiers.
    pub fn quote_char(&self) -> char {
        match self {
            Self::Postgres | Self::MsSql => '"',
            Self::MySql | Self::Sqlite | Self::Other(_) => '`',
        }
    }

    /// Whether the dialect accepts `INSERT INTO t SET ...`.
    pub fn supports_insert_set(&self) -> bool {
        matches!(self, Self::MySql | Self::Other(_))
    }

    /// Whether the dialect accepts `LIMIT` on `UPDATE`/`DELETE`.
    pub fn supports_write_limit(&self) -> bool {
        matches!(self, Self::MySql | Self::Other(_))
    }
}

/// Applies the dialect quote character to identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierQuoter {
    dialect: Dialect,
    quote: char,
}

impl IdentifierQuoter {
    pub fn new(dialect: Dialect) -> Self {
        let quote = dialect.quote_char();
        Self { dialect, quote }
    }

    pub fn for_dialect_name(name: &str) -> Self {
        Self::new(Dialect::from_name(name))
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn quote_char(&self) -> char {
        self.quote
    }

    /// Quotes an identifier, handling dotted `table.column` forms part by part.
    pub fn quote(&self, identifier: &str) -> String {
        identifier
            .split('.')
            .map(|part| self.quote_part(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn quote_part(&self, part: &str) -> String {
        if part == "*" {
            return part.to_string();
        }
        format!("{q}{part}{q}", q = self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::{Dialect, IdentifierQuoter};

    #[test]
    fn dialect_names_resolve_to_quote_characters() {
        for name in ["pgsql", "sqlsrv", "dblib", "mssql", "sybase", "postgres"] {
            assert_eq!(Dialect::from_name(name).quote_char(), '"', "{name}");
        }
        for name in ["mysql", "sqlite", "sqlite2", "firebird"] {
            assert_eq!(Dialect::from_name(name).quote_char(), '`', "{name}");
        }
        assert_eq!(
            Dialect::from_name("firebird"),
            Dialect::Other("firebird".to_string())
        );
    }

    #[test]
    fn quotes_dotted_identifiers_part_by_part() {
        let mysql = IdentifierQuoter::for_dialect_name("mysql");
        let postgres = IdentifierQuoter::for_dialect_name("pgsql");

        assert_eq!(mysql.quote("a.b"), "`a`.`b`");
        assert_eq!(postgres.quote("a.b"), "\"a\".\"b\"");
        assert_eq!(mysql.quote("categories"), "`categories`");
    }

    #[test]
    fn wildcard_passes_through_unquoted() {
        let mysql = IdentifierQuoter::for_dialect_name("mysql");
        let postgres = IdentifierQuoter::for_dialect_name("pgsql");

        assert_eq!(mysql.quote("*"), "*");
        assert_eq!(postgres.quote("*"), "*");
        assert_eq!(postgres.quote("t.*"), "\"t\".*");
    }

    #[test]
    fn write_forms_depend_on_dialect() {
        assert!(Dialect::MySql.supports_insert_set());
        assert!(Dialect::MySql.supports_write_limit());
        assert!(!Dialect::Sqlite.supports_insert_set());
        assert!(!Dialect::Postgres.supports_write_limit());
    }
}
