//! Storage collaborator contract and SQLite bootstrap.
//!
//! # Responsibility
//! - Define the narrow capability set the mapper consumes from a driver.
//! - Open and configure SQLite connections implementing that contract.
//!
//! # Invariants
//! - The mapper never talks to a driver except through `StorageConnection`.
//! - Driver failures surface as `StorageError` and are never swallowed.
//! - Tables are assumed to exist; no schema is created here.

use crate::model::value::Value;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod sqlite;

pub use open::{open_db, open_db_in_memory};

pub type StorageResult<T> = Result<T, StorageError>;

/// One fetched row keyed by column name.
pub type Row = HashMap<String, Value>;

/// Parameterized SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Failure reported by the storage collaborator.
#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    /// Failure from a non-SQLite driver, carried as text.
    Driver(String),
    /// The driver returned a scalar the caller cannot interpret.
    UnexpectedValue {
        context: &'static str,
        value: Value,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Driver(message) => write!(f, "{message}"),
            Self::UnexpectedValue { context, value } => {
                write!(f, "unexpected value `{value}` for {context}")
            }
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Driver(_) | Self::UnexpectedValue { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Capability set consumed by the mapper from a database connection.
///
/// Implementations decide their own thread-safety; the mapper issues one
/// call at a time per logical request and performs no retries.
pub trait StorageConnection {
    /// Driver/dialect name, e.g. `sqlite`, `mysql`, `pgsql`.
    fn dialect_name(&self) -> &str;

    /// Renders a scalar as a SQL literal safe for direct inclusion in text.
    fn quote_literal(&self, value: &Value) -> String;

    /// Executes a query and returns every row as a field map.
    fn fetch_all(&self, statement: &Statement) -> StorageResult<Vec<Row>>;

    /// Executes a query and returns the first column of the first row.
    fn fetch_column(&self, statement: &Statement) -> StorageResult<Option<Value>>;

    /// Executes a write and returns the number of affected rows.
    fn execute(&self, statement: &Statement) -> StorageResult<usize>;

    /// Identifier assigned by storage to the most recent insert.
    fn last_insert_id(&self) -> StorageResult<Value>;
}
