//! Active-record facade over one table.
//!
//! # Responsibility
//! - Bind a table to schema, quoting, query building and a connection.
//! - Expose CRUD, counting and finder operations.
//! - Track the lifecycle of record instances.
//!
//! # Invariants
//! - Write paths run the validation hook before any SQL.
//! - No failure is recovered locally; every error reaches the caller.

pub mod error;
pub mod record;
pub mod record_type;
