//! Table-bound records for SQL databases.
//!
//! A `RecordType` binds one table to a connection: it discovers the columns
//! and primary key once, quotes identifiers for the connection's dialect and
//! builds parameterized SQL for counting, fetching and writing `Record`s.

pub mod db;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod query;
pub mod schema;

pub use db::{open_db, open_db_in_memory, Row, Statement, StorageConnection, StorageError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use mapper::error::{MapperError, MapperResult};
pub use mapper::record::{Record, RecordState};
pub use mapper::record_type::{FinderOutput, RecordType, RecordTypeBuilder};
pub use model::fields::FieldMap;
pub use model::validate::{AcceptAll, RecordValidator, ValidationError};
pub use model::value::Value;
pub use query::finder::{FinderArg, FinderKind};
pub use schema::quote::{Dialect, IdentifierQuoter};

/// Minimal health-check API for integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
