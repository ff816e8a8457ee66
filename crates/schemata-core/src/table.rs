//! Tables: columns, indexes, constraints and table options

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::constraint::{ForeignKeyConstraint, UniqueConstraint};
use crate::index::Index;
use crate::name;
use crate::{Result, SchemaError};

/// A table snapshot
///
/// Collections are keyed by normalized name and keep insertion order. Every
/// foreign key and unique constraint is backed by an index: either one that
/// already existed when the constraint was added, or an implicit one created
/// for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    columns: IndexMap<String, Column>,
    indexes: IndexMap<String, Index>,
    implicit_indexes: BTreeSet<String>,
    unique_constraints: IndexMap<String, UniqueConstraint>,
    foreign_keys: IndexMap<String, ForeignKeyConstraint>,
    primary_key_name: Option<String>,
    options: BTreeMap<String, String>,
}

impl Table {
    /// Creates an empty table; `name` may be namespace qualified
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            implicit_indexes: BTreeSet::new(),
            unique_constraints: IndexMap::new(),
            foreign_keys: IndexMap::new(),
            primary_key_name: None,
            options: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized, possibly qualified, name
    pub fn normalized_name(&self) -> String {
        name::normalize_qualified(&self.name)
    }

    /// Normalized namespace, if the name is qualified
    pub fn namespace_name(&self) -> Option<String> {
        name::split_qualified(&self.name).0.map(name::normalize)
    }

    /// Normalized name without namespace
    pub fn short_name(&self) -> String {
        name::short_name(&self.name)
    }

    /// Normalized name, dropping the namespace when it is `default_namespace`
    pub fn shortest_name(&self, default_namespace: Option<&str>) -> String {
        name::shortest_name(&self.name, default_namespace)
    }

    // Columns

    pub fn add_column(&mut self, column: Column) -> Result<&mut Self> {
        let key = column.normalized_name();
        if self.columns.contains_key(&key) {
            return Err(SchemaError::ColumnAlreadyExists {
                table: self.name.clone(),
                column: column.name,
            });
        }
        self.columns.insert(key, column);
        Ok(self)
    }

    /// Adds a column, consuming and returning the table
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        self.add_column(column)?;
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(&name::normalize(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(&name::normalize(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(&name::normalize(name))
    }

    /// Columns in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Removes a column that no index or constraint refers to
    pub fn drop_column(&mut self, name: &str) -> Result<Column> {
        let key = name::normalize(name);
        let mentions = |columns: &[String]| columns.iter().any(|c| name::normalize(c) == key);

        let used_by = self
            .indexes
            .values()
            .find(|index| mentions(index.columns.as_slice()))
            .map(|index| index.name.clone())
            .or_else(|| {
                self.unique_constraints
                    .values()
                    .find(|constraint| mentions(constraint.columns.as_slice()))
                    .map(|constraint| constraint.name.clone())
            })
            .or_else(|| {
                self.foreign_keys
                    .values()
                    .find(|foreign_key| mentions(foreign_key.local_columns.as_slice()))
                    .map(|foreign_key| foreign_key.name.clone())
            });
        if let Some(used_by) = used_by {
            return Err(SchemaError::ColumnInUse {
                table: self.name.clone(),
                column: name.to_string(),
                used_by,
            });
        }

        self.columns
            .shift_remove(&key)
            .ok_or_else(|| SchemaError::ColumnDoesNotExist {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    fn ensure_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<()> {
        match columns.iter().find(|c| !self.has_column(c.as_ref())) {
            Some(missing) => Err(SchemaError::ColumnDoesNotExist {
                table: self.name.clone(),
                column: missing.as_ref().to_string(),
            }),
            None => Ok(()),
        }
    }

    // Primary key

    /// Declares the primary key; its columns become NOT NULL
    pub fn set_primary_key<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<&mut Self> {
        self.ensure_columns(columns)?;
        let index = Index::primary(columns.iter().map(|c| c.as_ref().to_string()));
        self.add_index(index)?;
        for column in columns {
            if let Some(column) = self.column_mut(column.as_ref()) {
                column.nullable = false;
            }
        }
        Ok(self)
    }

    pub fn primary_key(&self) -> Option<&Index> {
        self.primary_key_name
            .as_ref()
            .and_then(|name| self.indexes.get(name))
    }

    pub fn has_primary_key(&self) -> bool {
        self.primary_key().is_some()
    }

    /// Columns of the primary key, empty when there is none
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.primary_key()
            .map(|pk| pk.columns.iter().filter_map(|c| self.column(c)).collect())
            .unwrap_or_default()
    }

    pub fn drop_primary_key(&mut self) -> Option<Index> {
        let name = self.primary_key_name.take()?;
        self.indexes.shift_remove(&name)
    }

    // Indexes

    /// Adds an index.
    ///
    /// Implicit indexes that the new index fulfills or overrules are replaced
    /// by it. Fails on a duplicate name or a second primary key.
    pub fn add_index(&mut self, index: Index) -> Result<&mut Self> {
        index.validate()?;
        self.ensure_columns(&index.columns)?;
        let key = index.normalized_name();

        let replaced: Vec<String> = self
            .implicit_indexes
            .iter()
            .filter(|name| {
                self.indexes.get(*name).is_some_and(|implicit| {
                    implicit.is_fulfilled_by(&index) || index.overrules(implicit)
                })
            })
            .cloned()
            .collect();

        if index.is_primary && self.primary_key_name.is_some() {
            return Err(SchemaError::PrimaryKeyAlreadyExists(self.name.clone()));
        }
        if self.indexes.contains_key(&key) && !replaced.contains(&key) {
            return Err(SchemaError::IndexAlreadyExists {
                table: self.name.clone(),
                index: index.name,
            });
        }

        for name in replaced {
            self.indexes.shift_remove(&name);
            self.implicit_indexes.remove(&name);
        }
        if index.is_primary {
            self.primary_key_name = Some(key.clone());
        }
        self.indexes.insert(key, index);
        Ok(self)
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.get(&name::normalize(name))
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(&name::normalize(name))
    }

    /// Indexes (including the primary key) keyed by normalized name
    pub fn indexes(&self) -> impl Iterator<Item = (&str, &Index)> {
        self.indexes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the index was created implicitly for a constraint
    pub fn is_implicit_index(&self, name: &str) -> bool {
        self.implicit_indexes.contains(&name::normalize(name))
    }

    pub fn drop_index(&mut self, name: &str) -> Option<Index> {
        let key = name::normalize(name);
        if self.primary_key_name.as_deref() == Some(key.as_str()) {
            self.primary_key_name = None;
        }
        self.implicit_indexes.remove(&key);
        self.indexes.shift_remove(&key)
    }

    /// Adds `candidate` as an implicit index unless an existing index fulfills it
    fn add_implicit_index(&mut self, candidate: Index) {
        if self.indexes.values().any(|existing| candidate.is_fulfilled_by(existing)) {
            return;
        }
        let key = candidate.normalized_name();
        if self.indexes.contains_key(&key) {
            return;
        }
        self.implicit_indexes.insert(key.clone());
        self.indexes.insert(key, candidate);
    }

    fn generated_name<S: AsRef<str>>(&self, columns: &[S], suffix: &str) -> String {
        let mut parts = vec![self.short_name()];
        parts.extend(columns.iter().map(|c| name::normalize(c.as_ref())));
        parts.push(suffix.to_string());
        parts.join("_")
    }

    // Constraints

    pub fn add_unique_constraint(&mut self, mut constraint: UniqueConstraint) -> Result<&mut Self> {
        self.ensure_columns(&constraint.columns)?;
        if constraint.name.is_empty() {
            constraint.name = self.generated_name(&constraint.columns, "uniq");
        }
        let index_name = self.generated_name(&constraint.columns, "uniq_idx");
        let mut candidate = Index::unique(index_name, constraint.columns.clone());
        candidate.flags = constraint.flags.clone();
        self.add_implicit_index(candidate);
        self.unique_constraints
            .insert(constraint.normalized_name(), constraint);
        Ok(self)
    }

    pub fn unique_constraints(&self) -> impl Iterator<Item = &UniqueConstraint> {
        self.unique_constraints.values()
    }

    /// Adds a foreign key; an unnamed key gets a generated name
    pub fn add_foreign_key(&mut self, mut foreign_key: ForeignKeyConstraint) -> Result<&mut Self> {
        if foreign_key.local_columns.len() != foreign_key.foreign_columns.len() {
            return Err(SchemaError::ForeignKeyArity(
                foreign_key.name,
                foreign_key.local_columns.len(),
                foreign_key.foreign_columns.len(),
            ));
        }
        self.ensure_columns(&foreign_key.local_columns)?;
        if foreign_key.name.is_empty() {
            foreign_key.name = self.generated_name(&foreign_key.local_columns, "fk");
        }
        let key = foreign_key.normalized_name();
        if self.foreign_keys.contains_key(&key) {
            return Err(SchemaError::ForeignKeyAlreadyExists {
                table: self.name.clone(),
                name: foreign_key.name,
            });
        }
        foreign_key.local_table = Some(self.name.clone());

        let index_name = self.generated_name(&foreign_key.local_columns, "idx");
        self.add_implicit_index(Index::new(index_name, foreign_key.local_columns.clone()));
        self.foreign_keys.insert(key, foreign_key);
        Ok(self)
    }

    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKeyConstraint> {
        self.foreign_keys.get(&name::normalize(name))
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKeyConstraint> {
        self.foreign_keys.values()
    }

    pub fn drop_foreign_key(&mut self, name: &str) -> Option<ForeignKeyConstraint> {
        self.foreign_keys.shift_remove(&name::normalize(name))
    }

    // Options

    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogicalType;
    use pretty_assertions::assert_eq;

    fn users() -> Table {
        let mut table = Table::new("users");
        table
            .add_column(Column::new("id", LogicalType::Integer).autoincrement())
            .unwrap()
            .add_column(Column::new("email", LogicalType::String).with_length(255))
            .unwrap()
            .add_column(Column::new("team_id", LogicalType::Integer))
            .unwrap();
        table
    }

    #[test]
    fn test_columns_are_case_insensitive_unique() {
        let mut table = users();
        assert!(table.has_column("EMAIL"));
        assert!(table.has_column("\"Email\""));
        let err = table
            .add_column(Column::new("Email", LogicalType::Text))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::ColumnAlreadyExists {
                table: "users".to_string(),
                column: "Email".to_string()
            }
        );
    }

    #[test]
    fn test_primary_key_is_named_primary_and_not_null() {
        let mut table = users();
        table.set_primary_key(&["id"]).unwrap();

        let pk = table.primary_key().unwrap();
        assert_eq!(pk.name, "primary");
        assert!(pk.is_primary && pk.is_unique);
        assert!(!table.column("id").unwrap().nullable);
        assert_eq!(table.primary_key_columns().len(), 1);

        assert_eq!(
            table.set_primary_key(&["email"]).unwrap_err(),
            SchemaError::PrimaryKeyAlreadyExists("users".to_string())
        );
    }

    #[test]
    fn test_duplicate_index_name_rejected() {
        let mut table = users();
        table.add_index(Index::new("IDX_email", ["email"])).unwrap();
        assert!(table.add_index(Index::new("idx_email", ["team_id"])).is_err());
        assert!(table.add_index(Index::new("idx_x", ["missing"])).is_err());
    }

    #[test]
    fn test_foreign_key_creates_implicit_index() {
        let mut table = users();
        table
            .add_foreign_key(ForeignKeyConstraint::new("", ["team_id"], "teams", ["id"]))
            .unwrap();

        let fk = table.foreign_keys().next().unwrap();
        assert_eq!(fk.name, "users_team_id_fk");
        assert_eq!(fk.local_table.as_deref(), Some("users"));
        assert!(table.has_index("users_team_id_idx"));
        assert!(table.is_implicit_index("users_team_id_idx"));
    }

    #[test]
    fn test_foreign_key_reuses_existing_index() {
        let mut table = users();
        table.add_index(Index::unique("uniq_team", ["team_id"])).unwrap();
        table
            .add_foreign_key(ForeignKeyConstraint::new("fk_team", ["team_id"], "teams", ["id"]))
            .unwrap();

        assert_eq!(table.indexes().count(), 1);
    }

    #[test]
    fn test_explicit_index_replaces_implicit_one() {
        let mut table = users();
        table
            .add_foreign_key(ForeignKeyConstraint::new("fk_team", ["team_id"], "teams", ["id"]))
            .unwrap();
        table
            .add_index(Index::unique("uniq_team_email", ["team_id", "email"]))
            .unwrap();

        let names: Vec<&str> = table.indexes().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["uniq_team_email"]);
    }

    #[test]
    fn test_unique_constraint_creates_unique_index() {
        let mut table = users();
        table
            .add_unique_constraint(UniqueConstraint::new("", ["email"]))
            .unwrap();

        let index = table.index("users_email_uniq_idx").unwrap();
        assert!(index.is_unique);
        assert_eq!(table.unique_constraints().next().unwrap().name, "users_email_uniq");
    }

    #[test]
    fn test_foreign_key_arity_checked() {
        let mut table = users();
        let err = table
            .add_foreign_key(ForeignKeyConstraint::new("fk", ["team_id"], "teams", ["id", "x"]))
            .unwrap_err();
        assert_eq!(err, SchemaError::ForeignKeyArity("fk".to_string(), 1, 2));
    }

    #[test]
    fn test_qualified_names() {
        let table = Table::new("Audit.\"Events\"");
        assert_eq!(table.namespace_name().as_deref(), Some("audit"));
        assert_eq!(table.short_name(), "events");
        assert_eq!(table.shortest_name(Some("audit")), "events");
        assert_eq!(table.shortest_name(Some("public")), "audit.events");
    }

    #[test]
    fn test_drop_column_refuses_referenced_column() {
        let mut table = users();
        table.set_primary_key(&["id"]).unwrap();
        table
            .add_foreign_key(ForeignKeyConstraint::new("fk_team", ["team_id"], "teams", ["id"]))
            .unwrap();

        assert_eq!(
            table.drop_column("ID").unwrap_err(),
            SchemaError::ColumnInUse {
                table: "users".to_string(),
                column: "ID".to_string(),
                used_by: "primary".to_string()
            }
        );
        assert!(matches!(
            table.drop_column("team_id"),
            Err(SchemaError::ColumnInUse { .. })
        ));
        assert!(table.has_column("team_id"));

        assert_eq!(table.drop_column("email").unwrap().name, "email");
        assert!(!table.has_column("email"));
        assert!(matches!(
            table.drop_column("email"),
            Err(SchemaError::ColumnDoesNotExist { .. })
        ));
    }

    #[test]
    fn test_drop_index_clears_primary_key() {
        let mut table = users();
        table.set_primary_key(&["id"]).unwrap();
        assert!(table.drop_index("PRIMARY").is_some());
        assert!(!table.has_primary_key());
        table.set_primary_key(&["email"]).unwrap();
        assert_eq!(table.primary_key().unwrap().columns, vec!["email".to_string()]);
    }
}
