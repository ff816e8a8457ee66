//! Sequences

use serde::{Deserialize, Serialize};

use crate::name;
use crate::table::Table;

/// A sequence generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    /// Step between generated values
    pub allocation_size: i64,
    pub initial_value: i64,
    pub cache_size: Option<i64>,
}

impl Sequence {
    /// Creates a sequence starting at 1 with step 1
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allocation_size: 1,
            initial_value: 1,
            cache_size: None,
        }
    }

    pub fn with_allocation_size(mut self, allocation_size: i64) -> Self {
        self.allocation_size = allocation_size;
        self
    }

    pub fn with_initial_value(mut self, initial_value: i64) -> Self {
        self.initial_value = initial_value;
        self
    }

    pub fn with_cache_size(mut self, cache_size: i64) -> Self {
        self.cache_size = Some(cache_size);
        self
    }

    pub fn normalized_name(&self) -> String {
        name::normalize_qualified(&self.name)
    }

    pub fn namespace_name(&self) -> Option<String> {
        name::split_qualified(&self.name).0.map(name::normalize)
    }

    pub fn shortest_name(&self, default_namespace: Option<&str>) -> String {
        name::shortest_name(&self.name, default_namespace)
    }

    /// Whether this sequence is the one a platform creates implicitly for the
    /// table's autoincrement primary key.
    ///
    /// Purely a naming heuristic: the table must have a single column primary
    /// key that autoincrements, and the sequence must be called
    /// `{table}_{column}_seq`. A user sequence that happens to follow the same
    /// convention is classified as implicit too.
    pub fn is_autoincrement_for(&self, table: &Table) -> bool {
        let Some(primary_key) = table.primary_key() else {
            return false;
        };
        let [column_name] = primary_key.columns.as_slice() else {
            return false;
        };
        let Some(column) = table.column(column_name) else {
            return false;
        };
        if !column.autoincrement {
            return false;
        }

        let namespace = table.namespace_name();
        let expected = format!(
            "{}_{}_seq",
            table.shortest_name(namespace.as_deref()),
            column.normalized_name()
        );
        self.shortest_name(namespace.as_deref()) == expected
    }
}
