//! Error taxonomy for mapper operations.

use crate::db::StorageError;
use crate::model::validate::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MapperResult<T> = Result<T, MapperError>;

/// Failure surfaced by a record type or record operation.
///
/// No variant is recovered from locally; each carries enough context (table,
/// operation, field or call name) to diagnose the failing intent.
#[derive(Debug)]
pub enum MapperError {
    /// Columns or primary key of a table could not be resolved.
    SchemaDiscovery {
        table: String,
        reason: String,
        source: Option<StorageError>,
    },
    /// The validation hook rejected the record; nothing was written.
    Validation(ValidationError),
    /// The storage collaborator failed while running `operation`.
    Storage {
        operation: &'static str,
        table: String,
        source: StorageError,
    },
    /// A finder call name did not match `find_by_*` or `count_by_*`.
    NoSuchMethod(String),
    /// The record lifecycle does not allow `operation`.
    InvalidState {
        table: String,
        operation: &'static str,
        reason: &'static str,
    },
    /// Insert/update would have written no columns.
    EmptyWrite {
        table: String,
        operation: &'static str,
    },
    /// A field name is not a column of the table.
    UnknownColumn { table: String, column: String },
}

impl MapperError {
    pub(crate) fn storage(operation: &'static str, table: &str, source: StorageError) -> Self {
        Self::Storage {
            operation,
            table: table.to_string(),
            source,
        }
    }
}

impl Display for MapperError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaDiscovery { table, reason, .. } => {
                write!(f, "schema discovery failed for table `{table}`: {reason}")
            }
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Storage {
                operation,
                table,
                source,
            } => write!(f, "storage error during {operation} on `{table}`: {source}"),
            Self::NoSuchMethod(name) => write!(f, "no such finder method [{name}]"),
            Self::InvalidState {
                table,
                operation,
                reason,
            } => write!(f, "cannot {operation} record of `{table}`: {reason}"),
            Self::EmptyWrite { table, operation } => {
                write!(f, "{operation} on `{table}` has no columns to write")
            }
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` for table `{table}`")
            }
        }
    }
}

impl Error for MapperError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SchemaDiscovery { source, .. } => {
                source.as_ref().map(|err| err as &(dyn Error + 'static))
            }
            Self::Validation(err) => Some(err),
            Self::Storage { source, .. } => Some(source),
            Self::NoSuchMethod(_)
            | Self::InvalidState { .. }
            | Self::EmptyWrite { .. }
            | Self::UnknownColumn { .. } => None,
        }
    }
}

impl From<ValidationError> for MapperError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
