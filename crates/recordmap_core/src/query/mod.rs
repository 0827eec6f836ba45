//! SQL statement construction and convention-based finders.
//!
//! # Invariants
//! - Nothing in this module executes SQL.
//! - Caller-supplied WHERE fragments are trusted; values travel as parameters.

pub mod builder;
pub mod finder;
