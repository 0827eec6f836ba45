//! Validation hook invoked before every insert and update.
//!
//! # Invariants
//! - A validator runs before any write SQL is built or executed.
//! - Rejection aborts the write; the record keeps its in-memory state.

use crate::mapper::record::Record;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejection raised by a record validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending column, when the rule is about one field.
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for ValidationError {}

/// Business validation applied to a record before it is written.
pub trait RecordValidator {
    fn validate(&self, record: &Record) -> Result<(), ValidationError>;
}

/// Default hook: every record is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RecordValidator for AcceptAll {
    fn validate(&self, _record: &Record) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl<F> RecordValidator for F
where
    F: Fn(&Record) -> Result<(), ValidationError>,
{
    fn validate(&self, record: &Record) -> Result<(), ValidationError> {
        self(record)
    }
}
