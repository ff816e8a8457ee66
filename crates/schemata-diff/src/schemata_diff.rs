//! Schemata Diff - structural comparison of schema models
//!
//! This crate provides functionality for:
//! - Comparing two schemas into a diff of tables, columns, indexes,
//!   foreign keys, sequences and namespaces
//! - Pairing dropped and added columns or indexes into renames
//! - Filtering column changes that the target platform would not notice

pub mod compare;
pub mod platform;

pub use compare::*;
pub use platform::*;
