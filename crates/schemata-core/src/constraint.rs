//! Unique and foreign key constraints

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::name;

/// Referential action of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    /// Parses the SQL spelling (`ON DELETE <action>`)
    pub fn from_sql(action: &str) -> Option<Self> {
        match action.trim().to_uppercase().as_str() {
            "CASCADE" => Some(ReferentialAction::Cascade),
            "SET NULL" => Some(ReferentialAction::SetNull),
            "SET DEFAULT" => Some(ReferentialAction::SetDefault),
            "RESTRICT" => Some(ReferentialAction::Restrict),
            "NO ACTION" => Some(ReferentialAction::NoAction),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }

    /// Collapses `RESTRICT` and `NO ACTION` into "unset": all three behave
    /// the same for comparison purposes.
    pub fn effective(action: Option<Self>) -> Option<Self> {
        match action {
            Some(ReferentialAction::Restrict | ReferentialAction::NoAction) | None => None,
            other => other,
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A unique constraint over one or more columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub flags: BTreeSet<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl UniqueConstraint {
    pub fn new<S: Into<String>>(name: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            flags: BTreeSet::new(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_flag(mut self, flag: impl AsRef<str>) -> Self {
        self.flags.insert(flag.as_ref().to_lowercase());
        self
    }

    pub fn normalized_name(&self) -> String {
        name::normalize(&self.name)
    }
}

/// A foreign key from local columns to columns of another table
///
/// Local and foreign columns pair up by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    pub name: String,
    /// Owning table, filled in when the key is added to a table
    pub local_table: Option<String>,
    pub local_columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
    pub on_update: Option<ReferentialAction>,
    pub on_delete: Option<ReferentialAction>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ForeignKeyConstraint {
    pub fn new<L, F>(
        name: impl Into<String>,
        local_columns: impl IntoIterator<Item = L>,
        foreign_table: impl Into<String>,
        foreign_columns: impl IntoIterator<Item = F>,
    ) -> Self
    where
        L: Into<String>,
        F: Into<String>,
    {
        Self {
            name: name.into(),
            local_table: None,
            local_columns: local_columns.into_iter().map(Into::into).collect(),
            foreign_table: foreign_table.into(),
            foreign_columns: foreign_columns.into_iter().map(Into::into).collect(),
            on_update: None,
            on_delete: None,
            options: BTreeMap::new(),
        }
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn normalized_name(&self) -> String {
        name::normalize(&self.name)
    }

    /// Normalized foreign table name without its namespace
    pub fn unqualified_foreign_table(&self) -> String {
        name::short_name(&self.foreign_table)
    }

    /// Normalized, possibly qualified, foreign table name
    pub fn normalized_foreign_table(&self) -> String {
        name::normalize_qualified(&self.foreign_table)
    }

    /// Whether this key points at the given (normalized or raw) table name
    pub fn references_table(&self, table: &str, default_namespace: Option<&str>) -> bool {
        name::shortest_name(&self.foreign_table, default_namespace)
            == name::shortest_name(table, default_namespace)
    }

    pub fn effective_on_update(&self) -> Option<ReferentialAction> {
        ReferentialAction::effective(self.on_update)
    }

    pub fn effective_on_delete(&self) -> Option<ReferentialAction> {
        ReferentialAction::effective(self.on_delete)
    }
}
