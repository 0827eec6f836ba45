//! Lazy, write-once discovery of a table's columns.
//!
//! # Responsibility
//! - Issue the dialect's metadata query for one table.
//! - Cache the ordered column list and primary key for the process lifetime.
//!
//! # Invariants
//! - A successful metadata query runs at most once per catalog; a failed one
//!   is retried on the next call.
//! - A catalog is confined to one thread, like the connection it reads from.
//! - Column order is the order returned by the database.
//! - A discovered schema always contains the primary key column.

use crate::db::{Statement, StorageConnection};
use crate::mapper::error::{MapperError, MapperResult};
use crate::model::value::Value;
use crate::schema::quote::{Dialect, IdentifierQuoter};
use log::{error, info};
use once_cell::unsync::OnceCell;
use std::sync::Arc;
use std::time::Instant;

/// Resolved column metadata of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Arc<[String]>,
    primary_key: String,
}

impl TableSchema {
    pub fn new(columns: Vec<String>, primary_key: impl Into<String>) -> Self {
        Self {
            columns: columns.into(),
            primary_key: primary_key.into(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(crate) fn shared_columns(&self) -> Arc<[String]> {
        Arc::clone(&self.columns)
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| name == column)
    }
}

/// Metadata query plus the result column holding the column name.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataQuery {
    pub statement: Statement,
    pub name_column: &'static str,
}

/// Builds the column-listing query for `table` in the given dialect.
pub fn metadata_query(quoter: &IdentifierQuoter, table: &str) -> MetadataQuery {
    match quoter.dialect() {
        Dialect::Sqlite => MetadataQuery {
            statement: Statement::new(
                "SELECT name FROM pragma_table_info(?) ORDER BY cid",
                vec![Value::from(table)],
            ),
            name_column: "name",
        },
        Dialect::Postgres => information_schema_query("current_schema()", table),
        Dialect::MsSql => information_schema_query("SCHEMA_NAME()", table),
        Dialect::MySql | Dialect::Other(_) => MetadataQuery {
            statement: Statement::new(format!("DESCRIBE {}", quoter.quote(table)), Vec::new()),
            name_column: "Field",
        },
    }
}

/// Lists columns of `table` within the connection's current schema only, so a
/// name shared by several schemas does not merge their columns.
fn information_schema_query(current_schema: &str, table: &str) -> MetadataQuery {
    MetadataQuery {
        statement: Statement::new(
            format!(
                "SELECT column_name AS name FROM information_schema.columns \
                 WHERE table_schema = {current_schema} AND table_name = ? \
                 ORDER BY ordinal_position"
            ),
            vec![Value::from(table)],
        ),
        name_column: "name",
    }
}

/// Per-table schema cache, filled on first use.
#[derive(Debug)]
pub struct SchemaCatalog {
    table: String,
    primary_key: String,
    schema: OnceCell<TableSchema>,
}

impl SchemaCatalog {
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            schema: OnceCell::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Returns the cached schema, or `None` before first discovery.
    pub fn cached(&self) -> Option<&TableSchema> {
        self.schema.get()
    }

    /// Returns the schema, discovering it on first call.
    ///
    /// # Errors
    /// - `SchemaDiscovery` when the metadata query fails, the table has no
    ///   columns (does not exist), or the primary key is not a column.
    pub fn get_or_discover(
        &self,
        conn: &dyn StorageConnection,
        quoter: &IdentifierQuoter,
    ) -> MapperResult<&TableSchema> {
        self.schema.get_or_try_init(|| self.discover(conn, quoter))
    }

    fn discover(
        &self,
        conn: &dyn StorageConnection,
        quoter: &IdentifierQuoter,
    ) -> MapperResult<TableSchema> {
        let started_at = Instant::now();
        let query = metadata_query(quoter, &self.table);

        let rows = conn.fetch_all(&query.statement).map_err(|err| {
            error!(
                "event=schema_discover module=schema status=error table={} error_code=metadata_query_failed error={}",
                self.table, err
            );
            MapperError::SchemaDiscovery {
                table: self.table.clone(),
                reason: "metadata query failed".to_string(),
                source: Some(err),
            }
        })?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            match row.get(query.name_column).and_then(Value::as_str) {
                Some(name) => columns.push(name.to_string()),
                None => {
                    return Err(self.failure(format!(
                        "metadata row is missing text column `{}`",
                        query.name_column
                    )));
                }
            }
        }

        if columns.is_empty() {
            return Err(self.failure("table does not exist or has no columns".to_string()));
        }
        if !columns.iter().any(|name| name == &self.primary_key) {
            return Err(self.failure(format!(
                "primary key column `{}` not found",
                self.primary_key
            )));
        }

        info!(
            "event=schema_discover module=schema status=ok table={} columns={} duration_ms={}",
            self.table,
            columns.len(),
            started_at.elapsed().as_millis()
        );
        Ok(TableSchema::new(columns, self.primary_key.clone()))
    }

    fn failure(&self, reason: String) -> MapperError {
        error!(
            "event=schema_discover module=schema status=error table={} error_code=invalid_schema reason={}",
            self.table, reason
        );
        MapperError::SchemaDiscovery {
            table: self.table.clone(),
            reason,
            source: None,
        }
    }
}
