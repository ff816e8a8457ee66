//! Platform awareness for the comparator
//!
//! The comparator asks a [`ColumnEffectOracle`] whether a column property
//! difference would actually change the column on the target database.

mod oracle;
mod renderer;

pub use oracle::*;
pub use renderer::*;
