//! Schemata Core - vendor-neutral relational schema model
//!
//! This crate provides the value types the comparison engine works on:
//!
//! - `Table`, `Column`, `Index`, `UniqueConstraint`, `ForeignKeyConstraint`
//! - `Sequence` and `Schema`
//! - `TypeCatalog` - explicit mapping from type names to `LogicalType`
//!
//! Objects are plain snapshots. They are built by introspection code or by
//! hand and never mutated by the comparator.

mod column;
mod constraint;
mod error;
mod index;
pub mod name;
mod schema;
mod sequence;
mod table;
mod types;

pub use column::*;
pub use constraint::*;
pub use error::*;
pub use index::*;
pub use schema::*;
pub use sequence::*;
pub use table::*;
pub use types::*;
