//! Schema diff data structures
//!
//! Value types describing how one schema has to change to become another.
//! Keyed collections preserve the order in which the comparator found the
//! changes.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use schemata_core::{Column, ColumnProperty, ForeignKeyConstraint, Index, Sequence, Table};
use serde::{Deserialize, Serialize};

/// Represents the complete diff between two schemas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Namespaces that exist only in the new schema
    pub added_namespaces: BTreeSet<String>,
    /// Namespaces that exist only in the old schema
    pub removed_namespaces: BTreeSet<String>,
    /// Tables that exist only in the new schema, by shortest name
    pub added_tables: IndexMap<String, Table>,
    /// Tables that exist in both but have differences, by shortest name
    pub changed_tables: IndexMap<String, TableDiff>,
    /// Tables that exist only in the old schema, by shortest name
    pub removed_tables: IndexMap<String, Table>,
    pub added_sequences: Vec<Sequence>,
    pub changed_sequences: Vec<SequenceDiff>,
    pub removed_sequences: Vec<Sequence>,
    /// Foreign keys of the old schema that point at removed tables. They have
    /// to be dropped before the tables themselves.
    pub orphaned_foreign_keys: Vec<ForeignKeyConstraint>,
}

impl SchemaDiff {
    /// Creates a new empty schema diff
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no differences
    pub fn is_empty(&self) -> bool {
        self.added_namespaces.is_empty()
            && self.removed_namespaces.is_empty()
            && self.added_tables.is_empty()
            && self.changed_tables.is_empty()
            && self.removed_tables.is_empty()
            && self.added_sequences.is_empty()
            && self.changed_sequences.is_empty()
            && self.removed_sequences.is_empty()
            && self.orphaned_foreign_keys.is_empty()
    }

    /// Returns the total number of changes
    pub fn change_count(&self) -> usize {
        self.added_namespaces.len()
            + self.removed_namespaces.len()
            + self.added_tables.len()
            + self.changed_tables.len()
            + self.removed_tables.len()
            + self.added_sequences.len()
            + self.changed_sequences.len()
            + self.removed_sequences.len()
            + self.orphaned_foreign_keys.len()
    }

    /// Returns true if applying the diff can destroy data or break clients
    pub fn has_breaking_changes(&self) -> bool {
        !self.removed_namespaces.is_empty()
            || !self.removed_tables.is_empty()
            || !self.removed_sequences.is_empty()
            || !self.orphaned_foreign_keys.is_empty()
            || self.changed_tables.values().any(TableDiff::has_breaking_changes)
    }

    /// The part of this diff that never drops anything.
    ///
    /// Removed namespaces, tables, sequences and orphaned foreign keys are
    /// left out, as are column, index and foreign key removals inside changed
    /// tables. Table diffs left with nothing to do are dropped.
    pub fn without_removals(&self) -> SchemaDiff {
        let changed_tables = self
            .changed_tables
            .iter()
            .filter_map(|(name, table_diff)| {
                let mut table_diff = table_diff.clone();
                table_diff.removed_columns.clear();
                table_diff.removed_indexes.clear();
                table_diff.removed_foreign_keys.clear();
                (!table_diff.is_empty()).then(|| (name.clone(), table_diff))
            })
            .collect();

        SchemaDiff {
            added_namespaces: self.added_namespaces.clone(),
            removed_namespaces: BTreeSet::new(),
            added_tables: self.added_tables.clone(),
            changed_tables,
            removed_tables: IndexMap::new(),
            added_sequences: self.added_sequences.clone(),
            changed_sequences: self.changed_sequences.clone(),
            removed_sequences: Vec::new(),
            orphaned_foreign_keys: Vec::new(),
        }
    }
}

/// Represents differences in a single table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDiff {
    /// Name of the table in the old schema
    pub table_name: String,
    /// New table name, when the caller renames the table
    pub new_name: Option<String>,
    /// Old table snapshot
    pub from_table: Table,
    pub added_columns: IndexMap<String, Column>,
    pub changed_columns: IndexMap<String, ColumnDiff>,
    pub removed_columns: IndexMap<String, Column>,
    /// Renamed columns keyed by their old normalized name
    pub renamed_columns: IndexMap<String, Column>,
    pub added_indexes: IndexMap<String, Index>,
    pub changed_indexes: IndexMap<String, IndexDiff>,
    pub removed_indexes: IndexMap<String, Index>,
    /// Renamed indexes keyed by their old normalized name
    pub renamed_indexes: IndexMap<String, Index>,
    pub added_foreign_keys: Vec<ForeignKeyConstraint>,
    pub changed_foreign_keys: Vec<ForeignKeyDiff>,
    pub removed_foreign_keys: Vec<ForeignKeyConstraint>,
}

impl TableDiff {
    /// Creates an empty diff against the given old table
    pub fn new(from_table: &Table) -> Self {
        Self {
            table_name: from_table.name().to_string(),
            new_name: None,
            from_table: from_table.clone(),
            added_columns: IndexMap::new(),
            changed_columns: IndexMap::new(),
            removed_columns: IndexMap::new(),
            renamed_columns: IndexMap::new(),
            added_indexes: IndexMap::new(),
            changed_indexes: IndexMap::new(),
            removed_indexes: IndexMap::new(),
            renamed_indexes: IndexMap::new(),
            added_foreign_keys: Vec::new(),
            changed_foreign_keys: Vec::new(),
            removed_foreign_keys: Vec::new(),
        }
    }

    /// Records a rename of the table itself.
    ///
    /// The comparator never infers table renames; callers that know about one
    /// attach it here.
    pub fn renamed_to(mut self, new_name: impl Into<String>) -> Self {
        self.new_name = Some(new_name.into());
        self
    }

    /// Returns true if there are no changes in this table
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    /// Returns the number of individual changes
    pub fn change_count(&self) -> usize {
        usize::from(self.new_name.is_some())
            + self.added_columns.len()
            + self.changed_columns.len()
            + self.removed_columns.len()
            + self.renamed_columns.len()
            + self.added_indexes.len()
            + self.changed_indexes.len()
            + self.removed_indexes.len()
            + self.renamed_indexes.len()
            + self.added_foreign_keys.len()
            + self.changed_foreign_keys.len()
            + self.removed_foreign_keys.len()
    }

    /// Returns true if all changes are safe (additions only, no breaking changes)
    pub fn is_safe(&self) -> bool {
        self.new_name.is_none()
            && self.removed_columns.is_empty()
            && self.renamed_columns.is_empty()
            && self.changed_columns.values().all(ColumnDiff::is_safe)
            && self.removed_indexes.is_empty()
            && self.removed_foreign_keys.is_empty()
    }

    pub fn has_breaking_changes(&self) -> bool {
        !self.is_safe()
    }
}

/// Represents changes to a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDiff {
    /// Column name in the old table
    pub old_column_name: String,
    /// New column snapshot
    pub column: Column,
    /// Properties whose difference affects the column on the target platform
    pub changed_properties: BTreeSet<ColumnProperty>,
    /// Old column snapshot
    pub from_column: Column,
}

impl ColumnDiff {
    /// Creates a new column diff
    pub fn new(from_column: &Column, column: &Column, changed_properties: BTreeSet<ColumnProperty>) -> Self {
        Self {
            old_column_name: from_column.name.clone(),
            column: column.clone(),
            changed_properties,
            from_column: from_column.clone(),
        }
    }

    /// Returns true if there are no changes
    pub fn is_empty(&self) -> bool {
        self.changed_properties.is_empty()
    }

    pub fn has_changed(&self, property: &ColumnProperty) -> bool {
        self.changed_properties.contains(property)
    }

    /// Returns true if all changes are safe (no data loss risk)
    pub fn is_safe(&self) -> bool {
        if self.has_changed(&ColumnProperty::Type) {
            return false;
        }
        if self.has_changed(&ColumnProperty::Nullable)
            && self.from_column.nullable
            && !self.column.nullable
        {
            return false;
        }
        if self.has_changed(&ColumnProperty::Length)
            && let (Some(old), Some(new)) = (self.from_column.length, self.column.length)
            && new < old
        {
            return false;
        }
        true
    }
}

/// Represents changes to an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDiff {
    /// Index name
    pub index_name: String,
    /// Old index definition
    pub old: Index,
    /// New index definition
    pub new: Index,
}

impl IndexDiff {
    /// Creates a new index diff
    pub fn new(index_name: impl Into<String>, old: Index, new: Index) -> Self {
        Self {
            index_name: index_name.into(),
            old,
            new,
        }
    }
}

/// Represents changes to a foreign key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDiff {
    /// Foreign key name in the old table
    pub fk_name: String,
    pub old: ForeignKeyConstraint,
    pub new: ForeignKeyConstraint,
}

impl ForeignKeyDiff {
    /// Creates a new foreign key diff
    pub fn new(old: ForeignKeyConstraint, new: ForeignKeyConstraint) -> Self {
        Self {
            fk_name: old.name.clone(),
            old,
            new,
        }
    }

    /// True when the constraint name changed
    pub fn is_rename(&self) -> bool {
        self.old.normalized_name() != self.new.normalized_name()
    }
}

/// Represents changes to a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDiff {
    /// Sequence name
    pub sequence_name: String,
    pub old: Sequence,
    pub new: Sequence,
}

impl SequenceDiff {
    /// Creates a new sequence diff
    pub fn new(old: Sequence, new: Sequence) -> Self {
        Self {
            sequence_name: new.name.clone(),
            old,
            new,
        }
    }

    /// Allocation size change (old, new)
    pub fn allocation_size_change(&self) -> Option<(i64, i64)> {
        (self.old.allocation_size != self.new.allocation_size)
            .then_some((self.old.allocation_size, self.new.allocation_size))
    }

    /// Initial value change (old, new)
    pub fn initial_value_change(&self) -> Option<(i64, i64)> {
        (self.old.initial_value != self.new.initial_value)
            .then_some((self.old.initial_value, self.new.initial_value))
    }
}
