#![forbid(unsafe_code)]

use tc_core::{ConfigError, CoreError, InterpretationError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("no row matches {identifier}")]
    RowNotFound { identifier: String },
    #[error("{rows} rows match {identifier}; an identifier must name exactly one row")]
    AmbiguousIdentifier { identifier: String, rows: usize },
    #[error(transparent)]
    InterpretationFailed(#[from] InterpretationError),
    #[error("commit failed, nothing was written: {reason}")]
    CommitFailed { reason: String },
}
