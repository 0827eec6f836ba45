//! Record field state and its scalar values.
//!
//! # Responsibility
//! - Define the opaque scalar `Value` and its legacy emptiness rule.
//! - Hold per-record field state with a fixed key set.
//! - Define the validation hook contract.
//!
//! # Invariants
//! - No column type information is retained; values are opaque scalars.

pub mod fields;
pub mod validate;
pub mod value;
