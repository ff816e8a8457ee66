//! Schema comparator implementation
//!
//! Compares two schema models and produces the diff that turns the old one
//! into the new one.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use schemata_core::{
    Column, ColumnProperty, ForeignKeyConstraint, Index, Schema, Sequence, Table, name,
};
use thiserror::Error;

use super::config::CompareConfig;
use super::diff::{ColumnDiff, ForeignKeyDiff, IndexDiff, SchemaDiff, SequenceDiff, TableDiff};
use super::renames::resolve_renames;
use crate::platform::{ColumnEffectOracle, ColumnRenderer, DeclarationOracle, MetadataOracle, OracleError};

/// Errors that can occur during schema comparison
#[derive(Debug, Error)]
pub enum CompareError {
    /// The effect oracle could not judge a column difference
    #[error("effect oracle failed: {0}")]
    Oracle(#[from] OracleError),
    /// The comparator configuration could not be parsed
    #[error("invalid comparator configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for comparison operations
pub type CompareResult<T> = Result<T, CompareError>;

/// Schema comparator for comparing schema models
#[derive(Debug, Clone)]
pub struct SchemaComparator<O = MetadataOracle> {
    config: CompareConfig,
    oracle: O,
}

impl Default for SchemaComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaComparator {
    /// Creates a platform agnostic comparator with default configuration
    pub fn new() -> Self {
        Self::with_config(CompareConfig::default())
    }

    /// Creates a platform agnostic comparator with the given configuration
    pub fn with_config(config: CompareConfig) -> Self {
        Self {
            config,
            oracle: MetadataOracle,
        }
    }
}

impl<R: ColumnRenderer> SchemaComparator<DeclarationOracle<R>> {
    /// Creates a comparator that judges column changes by rendered declarations
    pub fn for_platform(renderer: R) -> Self {
        Self::with_oracle(CompareConfig::default(), DeclarationOracle::new(renderer))
    }
}

impl<O: ColumnEffectOracle> SchemaComparator<O> {
    /// Creates a comparator with a caller supplied effect oracle
    pub fn with_oracle(config: CompareConfig, oracle: O) -> Self {
        Self { config, oracle }
    }

    /// Returns the current configuration
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Compares two schemas and returns what has to change to turn `old`
    /// into `new`.
    pub fn compare_schemas(&self, old: &Schema, new: &Schema) -> CompareResult<SchemaDiff> {
        let mut diff = SchemaDiff::new();
        let old_default = old.default_namespace();
        let new_default = new.default_namespace();

        if self.config.compare_namespaces {
            for namespace in new.namespaces() {
                if !old.has_namespace(namespace) {
                    tracing::debug!("namespace '{}' added", namespace);
                    diff.added_namespaces.insert(namespace.to_string());
                }
            }
            for namespace in old.namespaces() {
                if !new.has_namespace(namespace) {
                    tracing::debug!("namespace '{}' removed", namespace);
                    diff.removed_namespaces.insert(namespace.to_string());
                }
            }
        }

        for table in new.tables() {
            let table_name = table.shortest_name(new_default);
            match old.table(&table_name) {
                None => {
                    tracing::debug!("table '{}' added", table_name);
                    diff.added_tables.insert(table_name, table.clone());
                }
                Some(old_table) => {
                    if let Some(table_diff) = self.diff_table(old_table, table)? {
                        tracing::debug!(
                            "table '{}' changed ({} changes)",
                            table_name,
                            table_diff.change_count()
                        );
                        diff.changed_tables.insert(table_name, table_diff);
                    }
                }
            }
        }

        let mut foreign_keys_to_table: IndexMap<String, Vec<&ForeignKeyConstraint>> =
            IndexMap::new();
        for table in old.tables() {
            let table_name = table.shortest_name(old_default);
            if !new.has_table(&table_name) {
                tracing::debug!("table '{}' removed", table_name);
                diff.removed_tables.insert(table_name, table.clone());
            }

            if self.config.compare_foreign_keys {
                for foreign_key in table.foreign_keys() {
                    foreign_keys_to_table
                        .entry(name::shortest_name(&foreign_key.foreign_table, old_default))
                        .or_default()
                        .push(foreign_key);
                }
            }
        }

        for removed_table in diff.removed_tables.keys() {
            let Some(foreign_keys) = foreign_keys_to_table.get(removed_table) else {
                continue;
            };
            for foreign_key in foreign_keys {
                tracing::debug!(
                    "foreign key '{}' orphaned by removal of '{}'",
                    foreign_key.name,
                    removed_table
                );
                diff.orphaned_foreign_keys.push((*foreign_key).clone());

                let Some(local_table) = &foreign_key.local_table else {
                    continue;
                };
                let local_table = name::shortest_name(local_table, old_default);
                for table_diff in diff.changed_tables.values_mut() {
                    if table_diff.from_table.shortest_name(old_default) == local_table {
                        table_diff.removed_foreign_keys.retain(|removed| {
                            !removed.references_table(removed_table, old_default)
                        });
                    }
                }
            }
        }
        diff.changed_tables
            .retain(|_, table_diff| !table_diff.is_empty());

        if self.config.compare_sequences {
            self.compare_sequences(old, new, &mut diff);
        }

        Ok(diff)
    }

    fn compare_sequences(&self, old: &Schema, new: &Schema, diff: &mut SchemaDiff) {
        for sequence in new.sequences() {
            let sequence_name = sequence.shortest_name(new.default_namespace());
            match old.sequence(&sequence_name) {
                Some(old_sequence) => {
                    if self.diff_sequence(old_sequence, sequence) {
                        tracing::debug!("sequence '{}' changed", sequence_name);
                        diff.changed_sequences
                            .push(SequenceDiff::new(old_sequence.clone(), sequence.clone()));
                    }
                }
                None if is_autoincrement_sequence_in(old, sequence) => {
                    tracing::debug!(
                        "sequence '{}' is implicit for an autoincrement column, not added",
                        sequence_name
                    );
                }
                None => {
                    tracing::debug!("sequence '{}' added", sequence_name);
                    diff.added_sequences.push(sequence.clone());
                }
            }
        }

        for sequence in old.sequences() {
            if is_autoincrement_sequence_in(new, sequence) {
                continue;
            }
            let sequence_name = sequence.shortest_name(old.default_namespace());
            if !new.has_sequence(&sequence_name) {
                tracing::debug!("sequence '{}' removed", sequence_name);
                diff.removed_sequences.push(sequence.clone());
            }
        }
    }

    /// Compares two versions of a table. Returns `None` when nothing changed.
    pub fn diff_table(&self, from: &Table, to: &Table) -> CompareResult<Option<TableDiff>> {
        let mut table_diff = TableDiff::new(from);

        let mut added_columns = IndexMap::new();
        for column in to.columns() {
            if !from.has_column(&column.name) {
                added_columns.insert(column.normalized_name(), column.clone());
            }
        }

        let mut removed_columns = IndexMap::new();
        for column in from.columns() {
            let Some(to_column) = to.column(&column.name) else {
                removed_columns.insert(column.normalized_name(), column.clone());
                continue;
            };
            let changed_properties = self.diff_column(column, to_column)?;
            if !changed_properties.is_empty() {
                table_diff.changed_columns.insert(
                    column.normalized_name(),
                    ColumnDiff::new(column, to_column, changed_properties),
                );
            }
        }

        if self.config.detect_column_renames {
            let columns = resolve_renames("column", added_columns, removed_columns, |old, new| {
                Ok::<_, CompareError>(self.diff_column(old, new)?.is_empty())
            })?;
            table_diff.added_columns = columns.added;
            table_diff.removed_columns = columns.removed;
            table_diff.renamed_columns = columns.renamed;
        } else {
            table_diff.added_columns = added_columns;
            table_diff.removed_columns = removed_columns;
        }

        self.diff_table_indexes(from, to, &mut table_diff)?;

        if self.config.compare_foreign_keys {
            self.diff_table_foreign_keys(from, to, &mut table_diff);
        }

        if table_diff.is_empty() {
            return Ok(None);
        }
        Ok(Some(table_diff))
    }

    fn diff_table_indexes(
        &self,
        from: &Table,
        to: &Table,
        table_diff: &mut TableDiff,
    ) -> CompareResult<()> {
        let mut added_indexes = IndexMap::new();
        for (index_name, index) in to.indexes() {
            if (index.is_primary && from.has_primary_key()) || from.has_index(index_name) {
                continue;
            }
            added_indexes.insert(index_name.to_string(), index.clone());
        }

        let mut removed_indexes = IndexMap::new();
        for (index_name, index) in from.indexes() {
            let counterpart = if index.is_primary {
                to.primary_key()
            } else {
                to.index(index_name)
            };
            match counterpart {
                None => {
                    removed_indexes.insert(index_name.to_string(), index.clone());
                }
                Some(to_index) if self.diff_index(index, to_index) => {
                    table_diff.changed_indexes.insert(
                        index_name.to_string(),
                        IndexDiff::new(index_name, index.clone(), to_index.clone()),
                    );
                }
                Some(_) => {}
            }
        }

        if self.config.detect_index_renames {
            let indexes = resolve_renames("index", added_indexes, removed_indexes, |old, new| {
                Ok::<_, CompareError>(!self.diff_index(old, new))
            })?;
            table_diff.added_indexes = indexes.added;
            table_diff.removed_indexes = indexes.removed;
            table_diff.renamed_indexes = indexes.renamed;
        } else {
            table_diff.added_indexes = added_indexes;
            table_diff.removed_indexes = removed_indexes;
        }
        Ok(())
    }

    fn diff_table_foreign_keys(&self, from: &Table, to: &Table, table_diff: &mut TableDiff) {
        let mut remaining_old: Vec<&ForeignKeyConstraint> = from.foreign_keys().collect();
        let mut remaining_new: Vec<&ForeignKeyConstraint> = to.foreign_keys().collect();
        let changed = &mut table_diff.changed_foreign_keys;

        // Keys equal in both name and structure cancel out
        remaining_old.retain(|old| {
            let Some(position) = remaining_new.iter().position(|new| {
                new.normalized_name() == old.normalized_name() && !self.diff_foreign_key(old, new)
            }) else {
                return true;
            };
            remaining_new.remove(position);
            false
        });

        // Structurally equal leftovers only changed their name
        remaining_old.retain(|old| {
            let Some(position) = remaining_new
                .iter()
                .position(|new| !self.diff_foreign_key(old, new))
            else {
                return true;
            };
            let new = remaining_new.remove(position);
            tracing::debug!("foreign key '{}' renamed to '{}'", old.name, new.name);
            changed.push(ForeignKeyDiff::new((*old).clone(), new.clone()));
            false
        });

        // Leftovers sharing a name were modified in place
        remaining_old.retain(|old| {
            let Some(position) = remaining_new
                .iter()
                .position(|new| new.normalized_name() == old.normalized_name())
            else {
                return true;
            };
            let new = remaining_new.remove(position);
            changed.push(ForeignKeyDiff::new((*old).clone(), new.clone()));
            false
        });

        table_diff.removed_foreign_keys = remaining_old.into_iter().cloned().collect();
        table_diff.added_foreign_keys = remaining_new.into_iter().cloned().collect();
    }

    /// Returns the properties that differ between two columns in a way the
    /// effect oracle considers significant. The column name never counts.
    ///
    /// When no single property matters on its own but the columns as a whole
    /// still render differently, every raw difference is reported.
    pub fn diff_column(
        &self,
        old: &Column,
        new: &Column,
    ) -> CompareResult<BTreeSet<ColumnProperty>> {
        let differing: Vec<ColumnProperty> = old
            .comparable_properties(new)
            .into_iter()
            .filter(|property| old.property_differs(property, new))
            .collect();

        let mut changed = BTreeSet::new();
        for property in &differing {
            let probe = new.with_property_from(property, old);
            let significant = self.oracle.renders_differently(property, &probe, new)?;
            tracing::trace!(
                "column '{}': {} differs, significant: {}",
                new.name,
                property,
                significant
            );
            if significant {
                changed.insert(property.clone());
            }
        }

        if changed.is_empty()
            && let Some(first) = differing.first()
            && self.oracle.renders_differently(first, old, new)?
        {
            tracing::trace!(
                "column '{}': differences only show in combination",
                new.name
            );
            changed.extend(differing);
        }
        Ok(changed)
    }

    /// Returns true when the two indexes are not interchangeable
    pub fn diff_index(&self, old: &Index, new: &Index) -> bool {
        !(old.is_fulfilled_by(new) && new.is_fulfilled_by(old))
    }

    /// Returns true when the two foreign keys differ in structure or behavior.
    /// Names and the foreign table's namespace are not compared.
    pub fn diff_foreign_key(&self, old: &ForeignKeyConstraint, new: &ForeignKeyConstraint) -> bool {
        !name::same_identifiers(&old.local_columns, &new.local_columns)
            || !name::same_identifiers(&old.foreign_columns, &new.foreign_columns)
            || old.unqualified_foreign_table() != new.unqualified_foreign_table()
            || old.effective_on_update() != new.effective_on_update()
            || old.effective_on_delete() != new.effective_on_delete()
    }

    /// Returns true when allocation size or initial value differ
    pub fn diff_sequence(&self, old: &Sequence, new: &Sequence) -> bool {
        old.allocation_size != new.allocation_size || old.initial_value != new.initial_value
    }
}

fn is_autoincrement_sequence_in(schema: &Schema, sequence: &Sequence) -> bool {
    schema
        .tables()
        .any(|table| sequence.is_autoincrement_for(table))
}
