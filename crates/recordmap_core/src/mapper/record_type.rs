//! Per-table descriptor and table-level operations.
//!
//! # Responsibility
//! - Bind one table to a connection, schema cache, quoter and validator.
//! - Provide lookups, counts, finders and delete-by-id for that table.
//! - Hydrate fetched rows into records sharing this descriptor.
//!
//! # Invariants
//! - Table name is non-empty; primary key defaults to `id`.
//! - Schema and quote character are resolved once, on first use, and never
//!   change for the descriptor's lifetime.
//! - Storage errors propagate unchanged, wrapped with operation and table.

use crate::db::{Row, Statement, StorageConnection, StorageError};
use crate::mapper::error::{MapperError, MapperResult};
use crate::mapper::record::{Record, RecordState};
use crate::model::validate::{AcceptAll, RecordValidator};
use crate::model::value::Value;
use crate::query::builder::QueryBuilder;
use crate::query::finder::{match_fragment, FinderArg, FinderCall, FinderKind};
use crate::schema::catalog::{SchemaCatalog, TableSchema};
use crate::schema::quote::IdentifierQuoter;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use once_cell::unsync::OnceCell;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Source of the current time for automatic timestamps.
pub type Clock = fn() -> DateTime<Utc>;

/// Configures and builds a `RecordType`.
pub struct RecordTypeBuilder {
    table: String,
    primary_key: String,
    validator: Box<dyn RecordValidator>,
    clock: Clock,
}

impl RecordTypeBuilder {
    /// Overrides the primary key column (default `id`).
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Installs the validation hook run before every insert and update.
    pub fn validator(mut self, validator: impl RecordValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Overrides the clock used for `created_at`/`updated_at`.
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Binds the configuration to a connection.
    ///
    /// Schema discovery is deferred until first use.
    ///
    /// # Errors
    /// - `SchemaDiscovery` when the table or primary key name is empty.
    pub fn build(self, conn: Arc<dyn StorageConnection>) -> MapperResult<Arc<RecordType>> {
        if self.table.trim().is_empty() {
            return Err(MapperError::SchemaDiscovery {
                table: self.table,
                reason: "table name cannot be empty".to_string(),
                source: None,
            });
        }
        if self.primary_key.trim().is_empty() {
            return Err(MapperError::SchemaDiscovery {
                table: self.table,
                reason: "primary key column cannot be empty".to_string(),
                source: None,
            });
        }

        Ok(Arc::new(RecordType {
            catalog: SchemaCatalog::new(self.table, self.primary_key),
            conn,
            quoter: OnceCell::new(),
            validator: self.validator,
            clock: self.clock,
        }))
    }
}

/// Result of a string-dispatched finder call.
#[derive(Debug)]
pub enum FinderOutput {
    Records(Vec<Record>),
    Count(u64),
}

/// Descriptor shared by every record of one table.
///
/// Lazily resolved schema and quoter live in single-thread cells, so a type
/// stays on the thread that owns its connection.
pub struct RecordType {
    catalog: SchemaCatalog,
    conn: Arc<dyn StorageConnection>,
    quoter: OnceCell<IdentifierQuoter>,
    validator: Box<dyn RecordValidator>,
    clock: Clock,
}

impl Debug for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordType")
            .field("table", &self.catalog.table())
            .field("primary_key", &self.catalog.primary_key())
            .field("schema", &self.catalog.cached())
            .field("quoter", &self.quoter.get())
            .finish_non_exhaustive()
    }
}

impl RecordType {
    pub fn builder(table: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            table: table.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            validator: Box::new(AcceptAll),
            clock: Utc::now,
        }
    }

    pub fn table(&self) -> &str {
        self.catalog.table()
    }

    pub fn primary_key(&self) -> &str {
        self.catalog.primary_key()
    }

    pub fn connection(&self) -> &dyn StorageConnection {
        self.conn.as_ref()
    }

    /// Quoter for the connection's dialect, resolved on first call.
    pub fn quoter(&self) -> &IdentifierQuoter {
        self.quoter.get_or_init(|| {
            let quoter = IdentifierQuoter::for_dialect_name(self.conn.dialect_name());
            debug!(
                "event=quoter_resolve module=mapper status=ok table={} dialect={} quote={}",
                self.table(),
                self.conn.dialect_name(),
                quoter.quote_char()
            );
            quoter
        })
    }

    /// Table schema, discovered on first call.
    ///
    /// # Errors
    /// - `SchemaDiscovery` when the table cannot be resolved.
    pub fn schema(&self) -> MapperResult<&TableSchema> {
        self.catalog
            .get_or_discover(self.conn.as_ref(), self.quoter())
    }

    /// Ordered column names of the table.
    pub fn columns(&self) -> MapperResult<&[String]> {
        Ok(self.schema()?.columns())
    }

    /// Creates a transient record with every field null.
    pub fn new_record(self: &Arc<Self>) -> MapperResult<Record> {
        let schema = self.schema()?;
        Ok(Record::new(
            Arc::clone(self),
            schema.shared_columns(),
            RecordState::New,
        ))
    }

    /// Creates a record hydrated from `row`.
    ///
    /// The record counts as bound to a row when the primary key is set,
    /// otherwise as transient.
    pub fn from_row(self: &Arc<Self>, row: &Row) -> MapperResult<Record> {
        let mut record = self.new_record()?;
        record.hydrate(row);
        if !record.id().is_falsy() {
            record.set_state(RecordState::Fetched);
        }
        Ok(record)
    }

    /// Fetches the record whose primary key equals `id`.
    pub fn get_by_id(self: &Arc<Self>, id: impl Into<Value>) -> MapperResult<Option<Record>> {
        let fragment = format!("{} = ?", self.quoter().quote(self.primary_key()));
        self.fetch_one_where(&fragment, vec![id.into()])
    }

    /// Record with the lowest primary key.
    pub fn first(self: &Arc<Self>) -> MapperResult<Option<Record>> {
        self.fetch_one_where(&self.ordered_by_primary_key("ASC"), Vec::new())
    }

    /// Record with the highest primary key.
    pub fn last(self: &Arc<Self>) -> MapperResult<Option<Record>> {
        self.fetch_one_where(&self.ordered_by_primary_key("DESC"), Vec::new())
    }

    /// Runs `SELECT *` with the given WHERE fragment.
    ///
    /// `fragment` is trusted SQL; values must be passed in `params`.
    pub fn fetch_all_where(
        self: &Arc<Self>,
        fragment: &str,
        params: Vec<Value>,
    ) -> MapperResult<Vec<Record>> {
        let statement = self.query_builder().build_select(fragment, params, false);
        let rows = self.run("fetch_all", || self.conn.fetch_all(&statement))?;
        rows.iter().map(|row| self.hydrate_fetched(row)).collect()
    }

    /// Runs `SELECT * ... LIMIT 1` with the given WHERE fragment.
    pub fn fetch_one_where(
        self: &Arc<Self>,
        fragment: &str,
        params: Vec<Value>,
    ) -> MapperResult<Option<Record>> {
        let statement = self.query_builder().build_select(fragment, params, true);
        let rows = self.run("fetch_one", || self.conn.fetch_all(&statement))?;
        rows.first().map(|row| self.hydrate_fetched(row)).transpose()
    }

    /// Counts rows matching the given WHERE fragment.
    pub fn count_where(&self, fragment: &str, params: Vec<Value>) -> MapperResult<u64> {
        let statement = self.query_builder().build_count(fragment, params);
        let value = self.run("count", || self.conn.fetch_column(&statement))?;
        match value {
            None => Ok(0),
            Some(value) => value
                .as_i64()
                .and_then(|count| u64::try_from(count).ok())
                .ok_or_else(|| {
                    MapperError::storage(
                        "count",
                        self.table(),
                        StorageError::UnexpectedValue {
                            context: "row count",
                            value,
                        },
                    )
                }),
        }
    }

    /// Deletes the row whose primary key equals `id`.
    ///
    /// Returns the number of rows removed (0 or 1).
    pub fn delete_by_id(&self, id: impl Into<Value>) -> MapperResult<usize> {
        let statement = self.query_builder().build_delete(self.primary_key(), id.into());
        let removed = self.run("delete", || self.conn.execute(&statement))?;
        info!(
            "event=record_delete module=mapper status=ok table={} rows={}",
            self.table(),
            removed
        );
        Ok(removed)
    }

    /// Finds records whose primary key equals `id`.
    pub fn find(self: &Arc<Self>, id: impl Into<Value>) -> MapperResult<Vec<Record>> {
        let primary_key = self.primary_key().to_string();
        self.find_by(&primary_key, FinderArg::Scalar(id.into()))
    }

    /// Finds records whose `field` matches `arg` (equality or IN-list).
    ///
    /// # Errors
    /// - `UnknownColumn` when `field` is not a column of the table.
    pub fn find_by(
        self: &Arc<Self>,
        field: &str,
        arg: impl Into<FinderArg>,
    ) -> MapperResult<Vec<Record>> {
        let fragment = self.finder_fragment(field, arg.into())?;
        self.fetch_all_where(&fragment.sql, fragment.params)
    }

    /// Counts rows whose `field` matches `arg` (equality or IN-list).
    pub fn count_by(&self, field: &str, arg: impl Into<FinderArg>) -> MapperResult<u64> {
        let fragment = self.finder_fragment(field, arg.into())?;
        self.count_where(&fragment.sql, fragment.params)
    }

    /// Routes a `find_by_<field>` / `count_by_<field>` call name.
    ///
    /// # Errors
    /// - `NoSuchMethod` for any other call name.
    pub fn dispatch(
        self: &Arc<Self>,
        name: &str,
        arg: impl Into<FinderArg>,
    ) -> MapperResult<FinderOutput> {
        let call = FinderCall::parse(name).inspect_err(|_| {
            error!(
                "event=finder_dispatch module=mapper status=error table={} error_code=no_such_method",
                self.table()
            );
        })?;
        match call.kind {
            FinderKind::Find => self.find_by(&call.field, arg).map(FinderOutput::Records),
            FinderKind::Count => self.count_by(&call.field, arg).map(FinderOutput::Count),
        }
    }

    pub(crate) fn query_builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self.quoter(), self.table())
    }

    pub(crate) fn validator(&self) -> &dyn RecordValidator {
        self.validator.as_ref()
    }

    /// Current UTC time formatted as `YYYY-MM-DD HH:MM:SS`.
    pub(crate) fn timestamp(&self) -> String {
        (self.clock)().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Runs one storage call, logging its outcome.
    pub(crate) fn run<T>(
        &self,
        operation: &'static str,
        call: impl FnOnce() -> Result<T, StorageError>,
    ) -> MapperResult<T> {
        let started_at = Instant::now();
        match call() {
            Ok(value) => {
                debug!(
                    "event=storage_call module=mapper status=ok table={} operation={} duration_ms={}",
                    self.table(),
                    operation,
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                error!(
                    "event=storage_call module=mapper status=error table={} operation={} duration_ms={} error={}",
                    self.table(),
                    operation,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(MapperError::storage(operation, self.table(), err))
            }
        }
    }

    fn finder_fragment(&self, field: &str, arg: FinderArg) -> MapperResult<Statement> {
        if !self.schema()?.has_column(field) {
            return Err(MapperError::UnknownColumn {
                table: self.table().to_string(),
                column: field.to_string(),
            });
        }
        Ok(match_fragment(self.quoter(), field, arg))
    }

    fn ordered_by_primary_key(&self, direction: &str) -> String {
        format!(
            "1=1 ORDER BY {} {direction}",
            self.quoter().quote(self.primary_key())
        )
    }

    fn hydrate_fetched(self: &Arc<Self>, row: &Row) -> MapperResult<Record> {
        let mut record = self.new_record()?;
        record.hydrate(row);
        record.set_state(RecordState::Fetched);
        Ok(record)
    }
}
