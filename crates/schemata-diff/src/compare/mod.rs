//! Schema comparison module
//!
//! Provides the comparator and the diff value types it produces.

mod comparator;
mod config;
mod diff;
mod renames;


pub use comparator::*;
pub use config::*;
pub use diff::*;
