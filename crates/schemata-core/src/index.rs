//! Index definitions and the structural relations between indexes

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::name;
use crate::{Result, SchemaError};

/// Name under which a table stores its primary key index
pub const PRIMARY_KEY_INDEX_NAME: &str = "primary";

/// Index options that take part in comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Per-column prefix lengths, one entry per indexed column
    pub lengths: Option<Vec<Option<u32>>>,
    /// Partial index predicate
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
    /// Any other vendor option, carried but not compared
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// An index over an ordered list of columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub is_primary: bool,
    /// Lowercased platform hints such as `fulltext` or `spatial`
    #[serde(default)]
    pub flags: BTreeSet<String>,
    #[serde(default)]
    pub options: IndexOptions,
}

impl Index {
    /// Creates a plain (non-unique) index
    pub fn new<S: Into<String>>(name: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            is_unique: false,
            is_primary: false,
            flags: BTreeSet::new(),
            options: IndexOptions::default(),
        }
    }

    /// Creates a unique index
    pub fn unique<S: Into<String>>(name: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        let mut index = Self::new(name, columns);
        index.is_unique = true;
        index
    }

    /// Creates the primary key index (always unique)
    pub fn primary<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let mut index = Self::unique(PRIMARY_KEY_INDEX_NAME, columns);
        index.is_primary = true;
        index
    }

    pub fn with_flag(mut self, flag: impl AsRef<str>) -> Self {
        self.flags.insert(flag.as_ref().to_lowercase());
        self
    }

    pub fn with_where(mut self, predicate: impl Into<String>) -> Self {
        self.options.where_clause = Some(predicate.into());
        self
    }

    pub fn with_lengths(mut self, lengths: Vec<Option<u32>>) -> Self {
        self.options.lengths = Some(lengths);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.extra.insert(key.into(), value.into());
        self
    }

    /// Normalized index name
    pub fn normalized_name(&self) -> String {
        name::normalize(&self.name)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(&flag.to_lowercase())
    }

    /// Neither unique nor primary
    pub fn is_simple(&self) -> bool {
        !self.is_unique && !self.is_primary
    }

    /// Checks the invariants the model relies on
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(SchemaError::EmptyIndex(self.name.clone()));
        }
        if let Some(lengths) = &self.options.lengths
            && lengths.len() != self.columns.len()
        {
            return Err(SchemaError::IndexLengthsArity(
                self.name.clone(),
                lengths.len(),
                self.columns.len(),
            ));
        }
        Ok(())
    }

    /// Position of a column in this index, if indexed
    pub fn column_position(&self, column: &str) -> Option<usize> {
        let column = name::normalize(column);
        self.columns.iter().position(|c| name::normalize(c) == column)
    }

    /// True when the leading columns of this index are exactly `columns`, in order
    pub fn spans_columns<S: AsRef<str>>(&self, columns: &[S]) -> bool {
        columns.len() <= self.columns.len()
            && name::same_identifiers(&self.columns[..columns.len()], columns)
    }

    /// True when both indexes have the same partial predicate (or none)
    pub fn same_partial_index(&self, other: &Index) -> bool {
        match (&self.options.where_clause, &other.options.where_clause) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// True when both indexes carry the same per-column lengths
    pub fn has_same_column_lengths(&self, other: &Index) -> bool {
        let lengths = |index: &Index| -> Vec<Option<u32>> {
            index
                .options
                .lengths
                .clone()
                .unwrap_or_else(|| vec![None; index.columns.len()])
        };
        lengths(self) == lengths(other)
    }

    /// Whether `other` satisfies everything this index provides.
    ///
    /// Column lists must match exactly. A simple index is fulfilled by any
    /// index over the same columns; a unique or primary index only by one with
    /// the same unique and primary flags.
    pub fn is_fulfilled_by(&self, other: &Index) -> bool {
        if other.columns.len() != self.columns.len() {
            return false;
        }
        if !self.spans_columns(&other.columns) {
            return false;
        }
        if !self.same_partial_index(other) || !self.has_same_column_lengths(other) {
            return false;
        }
        if self.is_simple() {
            return true;
        }
        other.is_primary == self.is_primary && other.is_unique == self.is_unique
    }

    /// Whether this index makes `other` redundant, so `other` may be dropped
    /// in favour of it.
    pub fn overrules(&self, other: &Index) -> bool {
        if other.is_primary {
            return false;
        }
        if self.is_simple() && other.is_unique {
            return false;
        }
        self.spans_columns(&other.columns)
            && (self.is_primary || self.is_unique)
            && self.same_partial_index(other)
    }
}
