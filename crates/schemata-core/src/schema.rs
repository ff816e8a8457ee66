//! Schemas: namespaces, tables and sequences

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::name;
use crate::sequence::Sequence;
use crate::table::Table;
use crate::{Result, SchemaError};

/// Naming context of a schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Schema name, informational
    pub name: Option<String>,
    /// Namespace assumed for unqualified table and sequence names
    pub default_namespace: Option<String>,
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }
}

/// A complete schema snapshot
///
/// Tables and sequences are keyed by their normalized name, qualified with
/// the default namespace when they are not qualified themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    config: SchemaConfig,
    namespaces: BTreeSet<String>,
    tables: IndexMap<String, Table>,
    sequences: IndexMap<String, Sequence>,
}

impl Schema {
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.config.default_namespace.as_deref()
    }

    fn key(&self, name: &str) -> String {
        name::qualify(name, self.default_namespace())
    }

    fn is_default_namespace(&self, namespace: &str) -> bool {
        self.default_namespace()
            .is_some_and(|default| name::normalize(default) == name::normalize(namespace))
    }

    // Namespaces

    /// Declares a namespace; declaring it twice is a no-op
    pub fn create_namespace(&mut self, namespace: &str) -> &mut Self {
        self.namespaces.insert(name::normalize(namespace));
        self
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(&name::normalize(namespace))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(String::as_str)
    }

    fn ensure_namespace(&mut self, namespace: Option<String>) {
        if let Some(namespace) = namespace
            && !self.is_default_namespace(&namespace)
        {
            self.namespaces.insert(namespace);
        }
    }

    // Tables

    /// Adds a table, declaring its namespace if needed
    pub fn add_table(&mut self, table: Table) -> Result<&mut Self> {
        let key = self.key(table.name());
        if self.tables.contains_key(&key) {
            return Err(SchemaError::TableAlreadyExists(table.name().to_string()));
        }
        self.ensure_namespace(table.namespace_name());
        self.tables.insert(key, table);
        Ok(self)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&self.key(name))
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        let key = self.key(name);
        self.tables.get_mut(&key)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&self.key(name))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn drop_table(&mut self, name: &str) -> Result<Table> {
        let key = self.key(name);
        self.tables
            .shift_remove(&key)
            .ok_or_else(|| SchemaError::TableDoesNotExist(name.to_string()))
    }

    // Sequences

    pub fn add_sequence(&mut self, sequence: Sequence) -> Result<&mut Self> {
        let key = self.key(&sequence.name);
        if self.sequences.contains_key(&key) {
            return Err(SchemaError::SequenceAlreadyExists(sequence.name));
        }
        self.ensure_namespace(sequence.namespace_name());
        self.sequences.insert(key, sequence);
        Ok(self)
    }

    pub fn sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences.get(&self.key(name))
    }

    pub fn has_sequence(&self, name: &str) -> bool {
        self.sequences.contains_key(&self.key(name))
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.values()
    }

    pub fn drop_sequence(&mut self, name: &str) -> Result<Sequence> {
        let key = self.key(name);
        self.sequences
            .shift_remove(&key)
            .ok_or_else(|| SchemaError::SequenceDoesNotExist(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public_schema() -> Schema {
        Schema::new(SchemaConfig::new().with_default_namespace("public"))
    }

    #[test]
    fn test_table_lookup_with_default_namespace() {
        let mut schema = public_schema();
        schema.add_table(Table::new("users")).unwrap();

        assert!(schema.has_table("users"));
        assert!(schema.has_table("public.users"));
        assert!(schema.has_table("PUBLIC.\"Users\""));
        assert!(!schema.has_table("audit.users"));
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut schema = public_schema();
        schema.add_table(Table::new("users")).unwrap();
        assert_eq!(
            schema.add_table(Table::new("public.users")).unwrap_err(),
            SchemaError::TableAlreadyExists("public.users".to_string())
        );
    }

    #[test]
    fn test_table_namespace_created_implicitly() {
        let mut schema = public_schema();
        schema.add_table(Table::new("audit.events")).unwrap();
        schema.add_table(Table::new("public.users")).unwrap();

        assert!(schema.has_namespace("AUDIT"));
        assert!(!schema.has_namespace("public"));
        assert_eq!(schema.namespaces().collect::<Vec<_>>(), vec!["audit"]);
    }

    #[test]
    fn test_sequences() {
        let mut schema = public_schema();
        schema
            .add_sequence(Sequence::new("billing.invoice_seq").with_allocation_size(10))
            .unwrap();

        assert!(schema.has_namespace("billing"));
        assert_eq!(
            schema.sequence("billing.invoice_seq").unwrap().allocation_size,
            10
        );
        assert!(schema.add_sequence(Sequence::new("billing.invoice_seq")).is_err());
        assert!(schema.drop_sequence("billing.invoice_seq").is_ok());
        assert!(schema.drop_sequence("billing.invoice_seq").is_err());
    }

    #[test]
    fn test_schema_config_deserializes() {
        let config: SchemaConfig =
            serde_json::from_str(r#"{"default_namespace": "public"}"#).unwrap();
        assert_eq!(config.default_namespace.as_deref(), Some("public"));
        assert_eq!(config.name, None);
    }
}
