//! Comparator configuration

use serde::{Deserialize, Serialize};

use super::comparator::CompareResult;

/// Configuration for schema comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    /// Whether to pair removed and added columns into renames
    pub detect_column_renames: bool,
    /// Whether to pair removed and added indexes into renames
    pub detect_index_renames: bool,
    /// Whether to compare foreign keys (and report orphaned ones)
    pub compare_foreign_keys: bool,
    /// Whether to compare sequences
    pub compare_sequences: bool,
    /// Whether to compare namespaces
    pub compare_namespaces: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            detect_column_renames: true,
            detect_index_renames: true,
            compare_foreign_keys: true,
            compare_sequences: true,
            compare_namespaces: true,
        }
    }
}

impl CompareConfig {
    /// Creates a new config with all options enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> CompareResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reports renamed columns as a drop plus an add
    pub fn without_column_renames(mut self) -> Self {
        self.detect_column_renames = false;
        self
    }

    /// Reports renamed indexes as a drop plus an add
    pub fn without_index_renames(mut self) -> Self {
        self.detect_index_renames = false;
        self
    }

    /// Disables foreign key comparison
    pub fn without_foreign_keys(mut self) -> Self {
        self.compare_foreign_keys = false;
        self
    }

    /// Disables sequence comparison
    pub fn without_sequences(mut self) -> Self {
        self.compare_sequences = false;
        self
    }

    /// Disables namespace comparison
    pub fn without_namespaces(mut self) -> Self {
        self.compare_namespaces = false;
        self
    }
}
