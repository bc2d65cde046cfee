#![forbid(unsafe_code)]

use crate::ids::IdentError;
use crate::value::TypeError;
use std::path::PathBuf;

/// Bad relationship description. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: IdentError },
    #[error("invalid column reference {0:?} (expected schema.table.column)")]
    InvalidReference(String),
    #[error("table {0} is declared more than once")]
    DuplicateTable(String),
    #[error("table {0} declares no columns")]
    EmptyTable(String),
    #[error("column {column} is declared more than once in {table}")]
    DuplicateColumn { table: String, column: String },
    #[error("label {label:?} names more than one column of {table}")]
    DuplicateAlias { table: String, label: String },
    #[error("primary key {column} is not a declared column of {table}")]
    UnknownPrimaryKey { table: String, column: String },
    #[error("unknown table {0}")]
    UnknownTable(String),
    #[error("unknown column {column} in {table}")]
    UnknownColumn { table: String, column: String },
    #[error("foreign key {0} references its own table")]
    SelfReference(String),
    #[error("traversal policy for {0} is declared more than once")]
    DuplicateRoot(String),
}

/// Request-level failures raised by the core, before any database access.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unknown table {0}")]
    UnknownTable(String),
    #[error("unknown column {column} in {table}")]
    UnknownColumn { table: String, column: String },
    #[error("no traversal policy is declared for {0}")]
    MissingTraversalPolicy(String),
    #[error("identifier value for {column}: {source}")]
    InvalidIdentifierValue {
        column: String,
        #[source]
        source: TypeError,
    },
    #[error("unsupported value for {column}: {source}")]
    UnsupportedType {
        column: String,
        #[source]
        source: TypeError,
    },
}
