//! Active-record instance: one row's fields plus its lifecycle.
//!
//! # Responsibility
//! - Own the field state of one row (or one unsaved row).
//! - Persist that state through insert/update/save/delete.
//!
//! # Invariants
//! - Field keys are exactly the table's columns.
//! - `save()` picks insert or update from the in-memory primary key only:
//!   a falsy key inserts, anything else updates.
//! - Validation runs before any write SQL is built.
//! - Update and delete require a primary key; a deleted record accepts no
//!   further writes.

use crate::db::Row;
use crate::mapper::error::{MapperError, MapperResult};
use crate::mapper::record_type::RecordType;
use crate::model::fields::{FieldMap, FieldStore};
use crate::model::value::Value;
use log::{error, info};
use serde::{Serialize, Serializer};
use std::sync::Arc;

const CREATED_AT_COLUMN: &str = "created_at";
const UPDATED_AT_COLUMN: &str = "updated_at";

/// Lifecycle position of a record instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Constructed in memory, never written.
    New,
    /// Hydrated from a fetched row.
    Fetched,
    /// Written by this instance (insert or update).
    Persisted,
    /// Row removed; terminal.
    Deleted,
}

/// One row of a mapped table.
#[derive(Debug, Clone)]
pub struct Record {
    record_type: Arc<RecordType>,
    fields: FieldStore,
    state: RecordState,
}

impl Record {
    pub(crate) fn new(
        record_type: Arc<RecordType>,
        columns: Arc<[String]>,
        state: RecordState,
    ) -> Self {
        Self {
            record_type,
            fields: FieldStore::new(columns),
            state,
        }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: RecordState) {
        self.state = state;
    }

    /// Ordered column list of the record's table.
    pub fn columns(&self) -> &[String] {
        self.fields.columns()
    }

    /// Value of `column`, or `None` when it is not a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Current primary key value (null when unsaved).
    pub fn id(&self) -> &Value {
        self.fields
            .get(self.record_type.primary_key())
            .unwrap_or(&Value::Null)
    }

    /// Sets one field.
    ///
    /// # Errors
    /// - `UnknownColumn` when `column` is not a column of the table.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> MapperResult<()> {
        match self.fields.set(column, value.into()) {
            Some(_) => Ok(()),
            None => Err(MapperError::UnknownColumn {
                table: self.record_type.table().to_string(),
                column: column.to_string(),
            }),
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> MapperResult<Self> {
        self.set(column, value)?;
        Ok(self)
    }

    /// Copies known columns from `row`; absent columns keep their values.
    pub fn hydrate(&mut self, row: &Row) {
        self.fields.hydrate(row);
    }

    /// Resets every field to null.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Snapshot of all fields in column order.
    pub fn to_map(&self) -> FieldMap {
        self.fields.to_map()
    }

    /// Runs the record type's validation hook.
    pub fn validate(&self) -> MapperResult<()> {
        self.record_type.validator().validate(self).map_err(|err| {
            info!(
                "event=record_validate module=mapper status=rejected table={} field={}",
                self.record_type.table(),
                err.field.as_deref().unwrap_or("-")
            );
            MapperError::from(err)
        })
    }

    /// Inserts when the primary key is falsy, updates otherwise.
    pub fn save(&mut self) -> MapperResult<()> {
        if self.id().is_falsy() {
            self.insert(true)
        } else {
            self.update(true)
        }
    }

    /// Inserts the record and adopts the storage-assigned primary key.
    ///
    /// With `auto_timestamp`, existing `created_at`/`updated_at` columns are
    /// set to the current UTC time first.
    ///
    /// # Errors
    /// - `InvalidState` for a deleted record.
    /// - `Validation` when the hook rejects the record.
    /// - `EmptyWrite` when no field is set.
    /// - `Storage` when the insert or id lookup fails.
    pub fn insert(&mut self, auto_timestamp: bool) -> MapperResult<()> {
        self.ensure_not_deleted("insert")?;

        if auto_timestamp {
            let now = self.record_type.timestamp();
            self.touch(CREATED_AT_COLUMN, &now);
            self.touch(UPDATED_AT_COLUMN, &now);
        }
        self.validate()?;

        let record_type = Arc::clone(&self.record_type);
        let primary_key = record_type.primary_key();

        // The key is left out of the INSERT and only replaced once storage assigns one.
        let builder = record_type.query_builder();
        let conn = record_type.connection();
        let set = builder.build_set_fragment(&self.fields, primary_key, true, |value| {
            conn.quote_literal(value)
        });
        if set.is_empty() {
            return Err(self.empty_write("insert"));
        }

        let statement = builder.build_insert(&set);
        record_type.run("insert", || conn.execute(&statement))?;
        let id = record_type.run("last_insert_id", || conn.last_insert_id())?;

        self.fields.set(primary_key, id);
        self.state = RecordState::Persisted;
        info!(
            "event=record_insert module=mapper status=ok table={} columns={}",
            record_type.table(),
            set.len()
        );
        Ok(())
    }

    /// Updates the row keyed by the current primary key.
    ///
    /// With `auto_timestamp`, an existing `updated_at` column is refreshed.
    ///
    /// # Errors
    /// - `InvalidState` without a primary key or for a deleted record.
    /// - `Validation` when the hook rejects the record.
    /// - `EmptyWrite` when no non-key field is set.
    /// - `Storage` when the update fails.
    pub fn update(&mut self, auto_timestamp: bool) -> MapperResult<()> {
        self.ensure_not_deleted("update")?;
        self.ensure_has_id("update")?;

        if auto_timestamp {
            let now = self.record_type.timestamp();
            self.touch(UPDATED_AT_COLUMN, &now);
        }
        self.validate()?;

        let record_type = Arc::clone(&self.record_type);
        let primary_key = record_type.primary_key();
        let builder = record_type.query_builder();
        let conn = record_type.connection();
        let set = builder.build_set_fragment(&self.fields, primary_key, true, |value| {
            conn.quote_literal(value)
        });
        if set.is_empty() {
            return Err(self.empty_write("update"));
        }

        let statement = builder.build_update(&set, primary_key, self.id().clone());
        let changed = record_type.run("update", || conn.execute(&statement))?;

        self.state = RecordState::Persisted;
        info!(
            "event=record_update module=mapper status=ok table={} columns={} rows={}",
            record_type.table(),
            set.len(),
            changed
        );
        Ok(())
    }

    /// Deletes the row keyed by the current primary key.
    ///
    /// Fields are left as they were; the record moves to `Deleted` and
    /// rejects further writes.
    pub fn delete(&mut self) -> MapperResult<()> {
        self.ensure_not_deleted("delete")?;
        self.ensure_has_id("delete")?;

        self.record_type.delete_by_id(self.id().clone())?;
        self.state = RecordState::Deleted;
        Ok(())
    }

    fn touch(&mut self, column: &str, now: &str) {
        // Only present columns are touched; `set` is a no-op otherwise.
        self.fields.set(column, Value::from(now));
    }

    fn ensure_not_deleted(&self, operation: &'static str) -> MapperResult<()> {
        if self.state == RecordState::Deleted {
            return Err(self.invalid_state(operation, "record has been deleted"));
        }
        Ok(())
    }

    fn ensure_has_id(&self, operation: &'static str) -> MapperResult<()> {
        if self.id().is_falsy() {
            return Err(self.invalid_state(operation, "primary key is not set"));
        }
        Ok(())
    }

    fn invalid_state(&self, operation: &'static str, reason: &'static str) -> MapperError {
        error!(
            "event=record_{} module=mapper status=error table={} error_code=invalid_state",
            operation,
            self.record_type.table()
        );
        MapperError::InvalidState {
            table: self.record_type.table().to_string(),
            operation,
            reason,
        }
    }

    fn empty_write(&self, operation: &'static str) -> MapperError {
        error!(
            "event=record_{} module=mapper status=error table={} error_code=empty_write",
            operation,
            self.record_type.table()
        );
        MapperError::EmptyWrite {
            table: self.record_type.table().to_string(),
            operation,
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.to_map().serialize(serializer)
    }
}
