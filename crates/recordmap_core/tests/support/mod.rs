//! Recording storage double shared by integration tests.

#![allow(dead_code)]

use recordmap_core::{Row, Statement, StorageConnection, StorageError, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

/// Records every statement and answers from scripted responses.
///
/// Metadata queries answer with the configured columns; SELECTs pop queued
/// row sets (empty when none are queued); COUNTs pop queued scalars.
pub struct RecordingConnection {
    dialect: String,
    columns: Vec<String>,
    statements: RefCell<Vec<Statement>>,
    metadata_queries: Cell<usize>,
    queued_rows: RefCell<VecDeque<Vec<Row>>>,
    queued_scalars: RefCell<VecDeque<Value>>,
    next_insert_id: Cell<i64>,
    fail_writes: Cell<bool>,
}

impl RecordingConnection {
    pub fn new(dialect: &str, columns: &[&str]) -> Self {
        Self {
            dialect: dialect.to_string(),
            columns: columns.iter().map(|name| name.to_string()).collect(),
            statements: RefCell::new(Vec::new()),
            metadata_queries: Cell::new(0),
            queued_rows: RefCell::new(VecDeque::new()),
            queued_scalars: RefCell::new(VecDeque::new()),
            next_insert_id: Cell::new(1),
            fail_writes: Cell::new(false),
        }
    }

    pub fn mysql(columns: &[&str]) -> Self {
        Self::new("mysql", columns)
    }

    pub fn categories() -> Self {
        Self::mysql(&["id", "name", "created_at", "updated_at"])
    }

    pub fn queue_rows(&self, rows: Vec<Row>) {
        self.queued_rows.borrow_mut().push_back(rows);
    }

    pub fn queue_scalar(&self, value: Value) {
        self.queued_scalars.borrow_mut().push_back(value);
    }

    pub fn set_next_insert_id(&self, id: i64) {
        self.next_insert_id.set(id);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.set(true);
    }

    pub fn metadata_queries(&self) -> usize {
        self.metadata_queries.get()
    }

    /// Statements issued so far, metadata queries excluded.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements.borrow().clone()
    }

    pub fn last_statement(&self) -> Statement {
        self.statements
            .borrow()
            .last()
            .cloned()
            .expect("at least one statement should have been issued")
    }

    fn is_metadata(statement: &Statement) -> bool {
        statement.sql.starts_with("DESCRIBE") || statement.sql.contains("information_schema")
    }
}

impl StorageConnection for RecordingConnection {
    fn dialect_name(&self) -> &str {
        &self.dialect
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            other => format!("'{}'", other.to_string().replace('\'', "''")),
        }
    }

    fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, StorageError> {
        if Self::is_metadata(statement) {
            self.metadata_queries.set(self.metadata_queries.get() + 1);
            let name_column = if statement.sql.starts_with("DESCRIBE") {
                "Field"
            } else {
                "name"
            };
            return Ok(self
                .columns
                .iter()
                .map(|column| row(&[(name_column, Value::from(column.as_str()))]))
                .collect());
        }

        self.statements.borrow_mut().push(statement.clone());
        Ok(self.queued_rows.borrow_mut().pop_front().unwrap_or_default())
    }

    fn fetch_column(&self, statement: &Statement) -> Result<Option<Value>, StorageError> {
        self.statements.borrow_mut().push(statement.clone());
        Ok(self.queued_scalars.borrow_mut().pop_front())
    }

    fn execute(&self, statement: &Statement) -> Result<usize, StorageError> {
        self.statements.borrow_mut().push(statement.clone());
        if self.fail_writes.get() {
            return Err(StorageError::Driver("duplicate entry".to_string()));
        }
        Ok(1)
    }

    fn last_insert_id(&self) -> Result<Value, StorageError> {
        Ok(Value::Integer(self.next_insert_id.get()))
    }
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect::<HashMap<_, _>>()
}
