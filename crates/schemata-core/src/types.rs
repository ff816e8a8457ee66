//! Logical column types and the type catalog
//!
//! Introspection code classifies vendor type names (`int4`, `NUMBER`,
//! `character varying`, ...) into a small set of [`LogicalType`]s before the
//! comparator ever sees them. The mapping lives in an explicitly constructed
//! [`TypeCatalog`] that is handed to whoever needs it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, SchemaError};

/// Semantic column type, independent of any vendor spelling
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Float,
    Boolean,
    String,
    Text,
    Binary,
    Blob,
    Guid,
    Date,
    Time,
    DateTime,
    DateTimeTz,
    Json,
    /// A user registered type, rendered from its catalog declaration
    Custom(String),
}

impl LogicalType {
    /// Integer types that can back an autoincrement column
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            LogicalType::SmallInt | LogicalType::Integer | LogicalType::BigInt
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, LogicalType::Decimal | LogicalType::Float)
    }

    /// Types whose declaration carries a length (`VARCHAR(n)`, `VARBINARY(n)`)
    pub fn has_length(&self) -> bool {
        matches!(self, LogicalType::String | LogicalType::Binary)
    }

    /// Types whose declaration carries precision and scale
    pub fn has_precision(&self) -> bool {
        matches!(self, LogicalType::Decimal)
    }

    /// Types that accept a character set or collation
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            LogicalType::String | LogicalType::Text | LogicalType::Guid
        )
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalType::SmallInt => "smallint",
            LogicalType::Integer => "integer",
            LogicalType::BigInt => "bigint",
            LogicalType::Decimal => "decimal",
            LogicalType::Float => "float",
            LogicalType::Boolean => "boolean",
            LogicalType::String => "string",
            LogicalType::Text => "text",
            LogicalType::Binary => "binary",
            LogicalType::Blob => "blob",
            LogicalType::Guid => "guid",
            LogicalType::Date => "date",
            LogicalType::Time => "time",
            LogicalType::DateTime => "datetime",
            LogicalType::DateTimeTz => "datetimetz",
            LogicalType::Json => "json",
            LogicalType::Custom(name) => name,
        };
        f.write_str(name)
    }
}

/// Registry of type names and custom type declarations
///
/// There is no process-wide instance: build one with [`TypeCatalog::standard`]
/// (or [`TypeCatalog::empty`] for fixtures) and pass it where it is needed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeCatalog {
    aliases: BTreeMap<String, LogicalType>,
    custom: BTreeMap<String, String>,
}

const STANDARD_ALIASES: &[(&str, LogicalType)] = &[
    ("smallint", LogicalType::SmallInt),
    ("int2", LogicalType::SmallInt),
    ("tinyint", LogicalType::SmallInt),
    ("integer", LogicalType::Integer),
    ("int", LogicalType::Integer),
    ("int4", LogicalType::Integer),
    ("mediumint", LogicalType::Integer),
    ("serial", LogicalType::Integer),
    ("bigint", LogicalType::BigInt),
    ("int8", LogicalType::BigInt),
    ("bigserial", LogicalType::BigInt),
    ("decimal", LogicalType::Decimal),
    ("numeric", LogicalType::Decimal),
    ("number", LogicalType::Decimal),
    ("float", LogicalType::Float),
    ("double", LogicalType::Float),
    ("double precision", LogicalType::Float),
    ("real", LogicalType::Float),
    ("float8", LogicalType::Float),
    ("boolean", LogicalType::Boolean),
    ("bool", LogicalType::Boolean),
    ("string", LogicalType::String),
    ("varchar", LogicalType::String),
    ("character varying", LogicalType::String),
    ("char", LogicalType::String),
    ("character", LogicalType::String),
    ("nvarchar", LogicalType::String),
    ("text", LogicalType::Text),
    ("longtext", LogicalType::Text),
    ("mediumtext", LogicalType::Text),
    ("clob", LogicalType::Text),
    ("binary", LogicalType::Binary),
    ("varbinary", LogicalType::Binary),
    ("blob", LogicalType::Blob),
    ("bytea", LogicalType::Blob),
    ("longblob", LogicalType::Blob),
    ("guid", LogicalType::Guid),
    ("uuid", LogicalType::Guid),
    ("uniqueidentifier", LogicalType::Guid),
    ("date", LogicalType::Date),
    ("time", LogicalType::Time),
    ("datetime", LogicalType::DateTime),
    ("timestamp", LogicalType::DateTime),
    ("timestamp without time zone", LogicalType::DateTime),
    ("datetimetz", LogicalType::DateTimeTz),
    ("timestamptz", LogicalType::DateTimeTz),
    ("timestamp with time zone", LogicalType::DateTimeTz),
    ("json", LogicalType::Json),
    ("jsonb", LogicalType::Json),
];

impl TypeCatalog {
    /// Creates a catalog with no names registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a catalog with the common SQL spellings registered
    pub fn standard() -> Self {
        let mut catalog = Self::empty();
        for (name, ty) in STANDARD_ALIASES {
            catalog.register_alias(*name, ty.clone());
        }
        catalog
    }

    /// Maps a type name onto a logical type, replacing any previous mapping
    pub fn register_alias(&mut self, name: impl AsRef<str>, ty: LogicalType) -> &mut Self {
        self.aliases.insert(name.as_ref().trim().to_lowercase(), ty);
        self
    }

    /// Registers a custom type together with the SQL used to declare it
    pub fn register_custom(
        &mut self,
        name: impl AsRef<str>,
        declaration: impl Into<String>,
    ) -> &mut Self {
        let key = name.as_ref().trim().to_lowercase();
        self.custom.insert(key.clone(), declaration.into());
        self.aliases.insert(key.clone(), LogicalType::Custom(key));
        self
    }

    /// Resolves a type name; a trailing `(n)` / `(p, s)` modifier is ignored
    pub fn resolve(&self, name: &str) -> Result<LogicalType> {
        let base = name.split('(').next().unwrap_or(name).trim().to_lowercase();
        self.aliases
            .get(&base)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// Declaration registered for a custom type
    pub fn custom_declaration(&self, name: &str) -> Option<&str> {
        self.custom.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_resolves_aliases() {
        let catalog = TypeCatalog::standard();
        assert_eq!(catalog.resolve("INT4").unwrap(), LogicalType::Integer);
        assert_eq!(catalog.resolve("varchar(255)").unwrap(), LogicalType::String);
        assert_eq!(catalog.resolve("numeric(10, 2)").unwrap(), LogicalType::Decimal);
        assert_eq!(
            catalog.resolve("timestamp with time zone").unwrap(),
            LogicalType::DateTimeTz
        );
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let catalog = TypeCatalog::empty();
        assert_eq!(
            catalog.resolve("integer"),
            Err(SchemaError::UnknownType("integer".to_string()))
        );
        assert!(!catalog.contains("integer"));
    }

    #[test]
    fn test_custom_type_registration() {
        let mut catalog = TypeCatalog::standard();
        catalog.register_custom("Money", "NUMERIC(19, 4)");

        assert_eq!(
            catalog.resolve("money").unwrap(),
            LogicalType::Custom("money".to_string())
        );
        assert_eq!(catalog.custom_declaration("MONEY"), Some("NUMERIC(19, 4)"));
        assert_eq!(catalog.custom_declaration("integer"), None);
    }

    #[test]
    fn test_catalogs_are_independent() {
        let mut a = TypeCatalog::standard();
        let b = TypeCatalog::standard();
        a.register_alias("citext", LogicalType::Text);
        assert!(a.contains("citext"));
        assert!(!b.contains("citext"));
    }
}
