//! Error types for the schema object model

use thiserror::Error;

/// Errors raised while building or mutating schema objects
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Column '{column}' already exists on table '{table}'")]
    ColumnAlreadyExists { table: String, column: String },

    #[error("Column '{column}' does not exist on table '{table}'")]
    ColumnDoesNotExist { table: String, column: String },

    #[error("Column '{column}' on table '{table}' is still used by '{used_by}'")]
    ColumnInUse {
        table: String,
        column: String,
        used_by: String,
    },

    #[error("Index '{index}' already exists on table '{table}'")]
    IndexAlreadyExists { table: String, index: String },

    #[error("Table '{0}' already has a primary key")]
    PrimaryKeyAlreadyExists(String),

    #[error("Foreign key '{name}' already exists on table '{table}'")]
    ForeignKeyAlreadyExists { table: String, name: String },

    #[error("Foreign key '{0}' maps {1} local columns onto {2} foreign columns")]
    ForeignKeyArity(String, usize, usize),

    #[error("Index '{0}' declares {1} column lengths for {2} columns")]
    IndexLengthsArity(String, usize, usize),

    #[error("Index '{0}' has no columns")]
    EmptyIndex(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Table '{0}' does not exist")]
    TableDoesNotExist(String),

    #[error("Sequence '{0}' already exists")]
    SequenceAlreadyExists(String),

    #[error("Sequence '{0}' does not exist")]
    SequenceDoesNotExist(String),

    #[error("Unknown column type '{0}'")]
    UnknownType(String),
}

/// Result type alias for schema model operations
pub type Result<T> = std::result::Result<T, SchemaError>;
