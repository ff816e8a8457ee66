//! Column definitions

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::name;
use crate::types::{LogicalType, TypeCatalog};
use crate::Result;

/// Platform option: character set of a textual column (MySQL)
pub const PLATFORM_OPTION_CHARSET: &str = "charset";
/// Platform option: collation of a textual column
pub const PLATFORM_OPTION_COLLATION: &str = "collation";
/// Platform option: store JSON as `JSONB` (PostgreSQL)
pub const PLATFORM_OPTION_JSONB: &str = "jsonb";
/// Custom schema option: inline `CHECK` expression
pub const CUSTOM_OPTION_CHECK: &str = "check";

/// A single table column
///
/// Platform options hold vendor knobs such as charset or collation; custom
/// schema options hold user supplied declaration fragments. Both are plain
/// string maps keyed by the constants in this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub logical_type: LogicalType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
    pub fixed: bool,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub autoincrement: bool,
    pub comment: Option<String>,
    #[serde(default)]
    pub platform_options: BTreeMap<String, String>,
    #[serde(default)]
    pub custom_schema_options: BTreeMap<String, String>,
}

impl Column {
    /// Creates a nullable column with no length, precision or default
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            length: None,
            precision: None,
            scale: None,
            unsigned: false,
            fixed: false,
            nullable: true,
            default_value: None,
            autoincrement: false,
            comment: None,
            platform_options: BTreeMap::new(),
            custom_schema_options: BTreeMap::new(),
        }
    }

    /// Creates a column from a vendor type name resolved through the catalog
    pub fn from_type_name(
        catalog: &TypeCatalog,
        name: impl Into<String>,
        type_name: &str,
    ) -> Result<Self> {
        Ok(Self::new(name, catalog.resolve(type_name)?))
    }

    /// Normalized (unquoted, lowercased) column name
    pub fn normalized_name(&self) -> String {
        name::normalize(&self.name)
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_platform_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.platform_options.insert(key.into(), value.into());
        self
    }

    pub fn with_custom_schema_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.custom_schema_options.insert(key.into(), value.into());
        self
    }

    /// Comment with the empty string treated as no comment
    pub fn effective_comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.is_empty())
    }

    /// Compares a single property of two columns by its stored value
    pub fn property_differs(&self, property: &ColumnProperty, other: &Column) -> bool {
        match property {
            ColumnProperty::Type => self.logical_type != other.logical_type,
            ColumnProperty::Length => self.length != other.length,
            ColumnProperty::Precision => self.precision != other.precision,
            ColumnProperty::Scale => self.scale != other.scale,
            ColumnProperty::Unsigned => self.unsigned != other.unsigned,
            ColumnProperty::Fixed => self.fixed != other.fixed,
            ColumnProperty::Nullable => self.nullable != other.nullable,
            ColumnProperty::Default => self.default_value != other.default_value,
            ColumnProperty::Autoincrement => self.autoincrement != other.autoincrement,
            ColumnProperty::Comment => self.effective_comment() != other.effective_comment(),
            ColumnProperty::PlatformOption(key) => {
                self.platform_options.get(key) != other.platform_options.get(key)
            }
            ColumnProperty::CustomSchemaOption(key) => {
                self.custom_schema_options.get(key) != other.custom_schema_options.get(key)
            }
        }
    }

    /// Every property that can be compared between `self` and `other`: the
    /// fixed properties plus each option key present on either side. The name
    /// is never included.
    pub fn comparable_properties(&self, other: &Column) -> Vec<ColumnProperty> {
        let mut properties = vec![
            ColumnProperty::Type,
            ColumnProperty::Length,
            ColumnProperty::Precision,
            ColumnProperty::Scale,
            ColumnProperty::Unsigned,
            ColumnProperty::Fixed,
            ColumnProperty::Nullable,
            ColumnProperty::Default,
            ColumnProperty::Autoincrement,
            ColumnProperty::Comment,
        ];
        let platform_keys: BTreeSet<&String> = self
            .platform_options
            .keys()
            .chain(other.platform_options.keys())
            .collect();
        properties.extend(
            platform_keys
                .into_iter()
                .map(|key| ColumnProperty::PlatformOption(key.clone())),
        );
        let custom_keys: BTreeSet<&String> = self
            .custom_schema_options
            .keys()
            .chain(other.custom_schema_options.keys())
            .collect();
        properties.extend(
            custom_keys
                .into_iter()
                .map(|key| ColumnProperty::CustomSchemaOption(key.clone())),
        );
        properties
    }

    /// Returns a copy of `self` where only `property` is taken from `source`.
    ///
    /// Option properties missing from `source` are removed from the copy.
    pub fn with_property_from(&self, property: &ColumnProperty, source: &Column) -> Column {
        let mut probe = self.clone();
        match property {
            ColumnProperty::Type => probe.logical_type = source.logical_type.clone(),
            ColumnProperty::Length => probe.length = source.length,
            ColumnProperty::Precision => probe.precision = source.precision,
            ColumnProperty::Scale => probe.scale = source.scale,
            ColumnProperty::Unsigned => probe.unsigned = source.unsigned,
            ColumnProperty::Fixed => probe.fixed = source.fixed,
            ColumnProperty::Nullable => probe.nullable = source.nullable,
            ColumnProperty::Default => probe.default_value = source.default_value.clone(),
            ColumnProperty::Autoincrement => probe.autoincrement = source.autoincrement,
            ColumnProperty::Comment => probe.comment = source.comment.clone(),
            ColumnProperty::PlatformOption(key) => {
                match source.platform_options.get(key) {
                    Some(value) => probe.platform_options.insert(key.clone(), value.clone()),
                    None => probe.platform_options.remove(key),
                };
            }
            ColumnProperty::CustomSchemaOption(key) => {
                match source.custom_schema_options.get(key) {
                    Some(value) => probe.custom_schema_options.insert(key.clone(), value.clone()),
                    None => probe.custom_schema_options.remove(key),
                };
            }
        }
        probe
    }
}

/// Tag naming one comparable column property
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnProperty {
    Type,
    Length,
    Precision,
    Scale,
    Unsigned,
    Fixed,
    Nullable,
    Default,
    Autoincrement,
    Comment,
    /// A key of [`Column::platform_options`]
    PlatformOption(String),
    /// A key of [`Column::custom_schema_options`]
    CustomSchemaOption(String),
}

impl fmt::Display for ColumnProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnProperty::Type => f.write_str("type"),
            ColumnProperty::Length => f.write_str("length"),
            ColumnProperty::Precision => f.write_str("precision"),
            ColumnProperty::Scale => f.write_str("scale"),
            ColumnProperty::Unsigned => f.write_str("unsigned"),
            ColumnProperty::Fixed => f.write_str("fixed"),
            ColumnProperty::Nullable => f.write_str("nullable"),
            ColumnProperty::Default => f.write_str("default"),
            ColumnProperty::Autoincrement => f.write_str("autoincrement"),
            ColumnProperty::Comment => f.write_str("comment"),
            ColumnProperty::PlatformOption(key) => write!(f, "platform_options.{}", key),
            ColumnProperty::CustomSchemaOption(key) => write!(f, "custom_schema_options.{}", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let column = Column::new("email", LogicalType::String);
        assert!(column.nullable);
        assert!(!column.autoincrement);
        assert_eq!(column.length, None);

        let column = column.with_length(120).not_null().with_default("''");
        assert_eq!(column.length, Some(120));
        assert!(!column.nullable);
        assert_eq!(column.default_value.as_deref(), Some("''"));
    }

    #[test]
    fn test_from_type_name_uses_catalog() {
        let catalog = TypeCatalog::standard();
        let column = Column::from_type_name(&catalog, "id", "int8").unwrap();
        assert_eq!(column.logical_type, LogicalType::BigInt);
        assert!(Column::from_type_name(&TypeCatalog::empty(), "id", "int8").is_err());
    }

    #[test]
    fn test_with_property_from_only_touches_one_property() {
        let old = Column::new("price", LogicalType::Decimal)
            .with_precision(10, 2)
            .with_comment("old");
        let new = Column::new("price", LogicalType::Decimal)
            .with_precision(12, 4)
            .with_comment("new");

        let probe = new.with_property_from(&ColumnProperty::Precision, &old);
        assert_eq!(probe.precision, Some(10));
        assert_eq!(probe.scale, Some(4));
        assert_eq!(probe.comment.as_deref(), Some("new"));
    }

    #[test]
    fn test_with_property_from_removes_missing_option() {
        let old = Column::new("name", LogicalType::String);
        let new = Column::new("name", LogicalType::String)
            .with_platform_option(PLATFORM_OPTION_COLLATION, "utf8mb4_bin");

        let probe = new.with_property_from(
            &ColumnProperty::PlatformOption(PLATFORM_OPTION_COLLATION.to_string()),
            &old,
        );
        assert!(probe.platform_options.is_empty());
    }

    #[test]
    fn test_comparable_properties_include_option_keys_from_both_sides() {
        let a = Column::new("a", LogicalType::String).with_platform_option("charset", "utf8");
        let b = Column::new("b", LogicalType::String)
            .with_platform_option("collation", "utf8_bin")
            .with_custom_schema_option(CUSTOM_OPTION_CHECK, "length(b) > 0");

        let properties = a.comparable_properties(&b);
        assert_eq!(properties.len(), 13);
        assert!(properties.contains(&ColumnProperty::PlatformOption("charset".into())));
        assert!(properties.contains(&ColumnProperty::PlatformOption("collation".into())));
        assert!(properties.contains(&ColumnProperty::CustomSchemaOption("check".into())));
        assert!(a.property_differs(&ColumnProperty::PlatformOption("charset".into()), &b));
        assert!(!a.property_differs(&ColumnProperty::Type, &b));
    }

    #[test]
    fn test_comment_empty_and_missing_are_equal() {
        let a = Column::new("a", LogicalType::Text).with_comment("");
        let b = Column::new("a", LogicalType::Text);
        assert!(!a.property_differs(&ColumnProperty::Comment, &b));
    }

    #[test]
    fn test_effective_comment_treats_empty_as_none() {
        assert_eq!(Column::new("a", LogicalType::Text).with_comment("").effective_comment(), None);
        assert_eq!(
            ColumnProperty::PlatformOption("charset".into()).to_string(),
            "platform_options.charset"
        );
    }
}
