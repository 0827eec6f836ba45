//! Schema binding: dialect detection, identifier quoting, column discovery.
//!
//! # Invariants
//! - Quote character and columns are resolved once per record type.
//! - Identifiers are trusted schema names, never user input.

pub mod catalog;
pub mod quote;
