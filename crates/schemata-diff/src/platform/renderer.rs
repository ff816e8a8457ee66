//! Column declaration rendering
//!
//! Renders the SQL fragment that declares a column (everything after the
//! column name) for a handful of dialects. This is only as much DDL as the
//! declaration oracle needs to decide whether two columns look the same to a
//! database.

use std::fmt;

use schemata_core::{
    CUSTOM_OPTION_CHECK, Column, LogicalType, PLATFORM_OPTION_CHARSET, PLATFORM_OPTION_COLLATION,
    PLATFORM_OPTION_JSONB, TypeCatalog,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length used for string and binary columns that declare none
pub const DEFAULT_STRING_LENGTH: u32 = 255;
/// Precision used for decimal columns that declare none
pub const DEFAULT_DECIMAL_PRECISION: u32 = 10;

/// Errors that can occur while rendering a column declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The logical type has no declaration on this dialect
    #[error("type '{type_name}' has no declaration for {dialect}")]
    UnsupportedType { dialect: Dialect, type_name: String },
}

/// Renders the declaration of a single column
pub trait ColumnRenderer {
    /// Declaration text without the column name, e.g. `VARCHAR(255) NOT NULL`
    fn column_declaration(&self, column: &Column) -> Result<String, RenderError>;

    /// Whether comments are part of the declaration text
    fn supports_inline_comments(&self) -> bool {
        false
    }
}

/// SQL dialect a declaration is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    PostgreSQL,
    MySQL,
    SQLite,
}

impl Dialect {
    /// Returns the identifier quote character for this dialect
    pub fn quote_char(&self) -> char {
        match self {
            Dialect::PostgreSQL | Dialect::SQLite => '"',
            Dialect::MySQL => '`',
        }
    }

    /// Quotes an identifier, doubling embedded quote characters
    pub fn quote_identifier(&self, name: &str) -> String {
        let quote = self.quote_char();
        let escaped = name.replace(quote, &format!("{}{}", quote, quote));
        format!("{}{}{}", quote, escaped, quote)
    }

    /// Quotes a string literal
    pub fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    pub fn supports_unsigned(&self) -> bool {
        matches!(self, Dialect::MySQL)
    }

    pub fn supports_charset(&self) -> bool {
        matches!(self, Dialect::MySQL)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::PostgreSQL => "PostgreSQL",
            Dialect::MySQL => "MySQL",
            Dialect::SQLite => "SQLite",
        };
        f.write_str(name)
    }
}

/// Declaration renderer for one dialect, resolving custom types through a catalog
#[derive(Debug, Clone, Copy)]
pub struct DialectRenderer<'a> {
    dialect: Dialect,
    catalog: &'a TypeCatalog,
}

impl<'a> DialectRenderer<'a> {
    pub fn new(dialect: Dialect, catalog: &'a TypeCatalog) -> Self {
        Self { dialect, catalog }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Full `name declaration` fragment as it would appear in `CREATE TABLE`
    pub fn column_definition(&self, column: &Column) -> Result<String, RenderError> {
        Ok(format!(
            "{} {}",
            self.dialect.quote_identifier(&column.name),
            self.column_declaration(column)?
        ))
    }

    fn type_declaration(&self, column: &Column) -> Result<String, RenderError> {
        let length = column.length.unwrap_or(DEFAULT_STRING_LENGTH);
        let precision = column.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION);
        let scale = column.scale.unwrap_or(0);
        let autoincrement = column.autoincrement && column.logical_type.is_integer();

        let declaration: String = match (self.dialect, &column.logical_type) {
            (Dialect::PostgreSQL, LogicalType::SmallInt) if autoincrement => "SMALLSERIAL".into(),
            (Dialect::PostgreSQL, LogicalType::Integer) if autoincrement => "SERIAL".into(),
            (Dialect::PostgreSQL, LogicalType::BigInt) if autoincrement => "BIGSERIAL".into(),
            (_, LogicalType::SmallInt) => "SMALLINT".into(),
            (Dialect::MySQL, LogicalType::Integer) => "INT".into(),
            (_, LogicalType::Integer) => "INTEGER".into(),
            (_, LogicalType::BigInt) => "BIGINT".into(),
            (_, LogicalType::Decimal) => format!("NUMERIC({}, {})", precision, scale),
            (_, LogicalType::Float) => "DOUBLE PRECISION".into(),
            (Dialect::MySQL, LogicalType::Boolean) => "TINYINT(1)".into(),
            (_, LogicalType::Boolean) => "BOOLEAN".into(),
            (_, LogicalType::String) if column.fixed => format!("CHAR({})", length),
            (_, LogicalType::String) => format!("VARCHAR({})", length),
            (Dialect::PostgreSQL, LogicalType::Text) => "TEXT".into(),
            (Dialect::MySQL, LogicalType::Text) => "LONGTEXT".into(),
            (Dialect::SQLite, LogicalType::Text) => "CLOB".into(),
            (Dialect::PostgreSQL, LogicalType::Binary | LogicalType::Blob) => "BYTEA".into(),
            (Dialect::MySQL, LogicalType::Binary) if column.fixed => format!("BINARY({})", length),
            (Dialect::MySQL, LogicalType::Binary) => format!("VARBINARY({})", length),
            (Dialect::MySQL, LogicalType::Blob) => "LONGBLOB".into(),
            (Dialect::SQLite, LogicalType::Binary | LogicalType::Blob) => "BLOB".into(),
            (Dialect::PostgreSQL, LogicalType::Guid) => "UUID".into(),
            (_, LogicalType::Guid) => "CHAR(36)".into(),
            (_, LogicalType::Date) => "DATE".into(),
            (Dialect::PostgreSQL, LogicalType::Time) => "TIME(0) WITHOUT TIME ZONE".into(),
            (_, LogicalType::Time) => "TIME".into(),
            (Dialect::PostgreSQL, LogicalType::DateTime) => {
                "TIMESTAMP(0) WITHOUT TIME ZONE".into()
            }
            (Dialect::PostgreSQL, LogicalType::DateTimeTz) => "TIMESTAMP(0) WITH TIME ZONE".into(),
            (_, LogicalType::DateTime | LogicalType::DateTimeTz) => "DATETIME".into(),
            (Dialect::PostgreSQL, LogicalType::Json)
                if column.platform_options.contains_key(PLATFORM_OPTION_JSONB) =>
            {
                "JSONB".into()
            }
            (Dialect::SQLite, LogicalType::Json) => "CLOB".into(),
            (_, LogicalType::Json) => "JSON".into(),
            (_, LogicalType::Custom(name)) => self
                .catalog
                .custom_declaration(name)
                .map(str::to_string)
                .ok_or_else(|| RenderError::UnsupportedType {
                    dialect: self.dialect,
                    type_name: name.clone(),
                })?,
        };
        Ok(declaration)
    }
}

impl ColumnRenderer for DialectRenderer<'_> {
    fn column_declaration(&self, column: &Column) -> Result<String, RenderError> {
        let mut def = self.type_declaration(column)?;
        let ty = &column.logical_type;

        if column.unsigned && ty.is_numeric() && self.dialect.supports_unsigned() {
            def.push_str(" UNSIGNED");
        }

        if ty.is_textual() {
            if self.dialect.supports_charset()
                && let Some(charset) = column.platform_options.get(PLATFORM_OPTION_CHARSET)
            {
                def.push_str(&format!(" CHARACTER SET {}", charset));
            }
            if let Some(collation) = column.platform_options.get(PLATFORM_OPTION_COLLATION) {
                match self.dialect {
                    Dialect::PostgreSQL => {
                        def.push_str(&format!(" COLLATE {}", self.dialect.quote_identifier(collation)))
                    }
                    Dialect::MySQL | Dialect::SQLite => {
                        def.push_str(&format!(" COLLATE {}", collation))
                    }
                }
            }
        }

        if let Some(default) = &column.default_value {
            def.push_str(&format!(" DEFAULT {}", default));
        }

        if !column.nullable {
            def.push_str(" NOT NULL");
        }

        if column.autoincrement && ty.is_integer() {
            match self.dialect {
                // already expressed by the SERIAL family
                Dialect::PostgreSQL => {}
                Dialect::MySQL => def.push_str(" AUTO_INCREMENT"),
                Dialect::SQLite => def.push_str(" PRIMARY KEY AUTOINCREMENT"),
            }
        }

        if let Some(check) = column.custom_schema_options.get(CUSTOM_OPTION_CHECK) {
            def.push_str(&format!(" CHECK ({})", check));
        }

        if self.supports_inline_comments()
            && let Some(comment) = column.effective_comment()
        {
            def.push_str(&format!(" COMMENT {}", self.dialect.quote_literal(comment)));
        }

        Ok(def)
    }

    fn supports_inline_comments(&self) -> bool {
        matches!(self.dialect, Dialect::MySQL)
    }
}
