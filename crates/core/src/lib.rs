#![forbid(unsafe_code)]

//! Relationship graph, read planning, statement building and change mapping
//! for tablechat. Nothing in this crate touches a database connection.

pub mod config;
pub mod error;
pub mod graph;
pub mod ids;
pub mod interpret;
pub mod mapper;
pub mod resolve;
pub mod snapshot;
pub mod statement;
pub mod value;

#[cfg(test)]
mod fixtures;

pub use config::{Config, DatabaseConfig, InterpreterConfig, SchemaDescription};
pub use error::{ConfigError, CoreError};
pub use graph::{RelationshipGraph, SharedGraph};
pub use ids::{Ident, QualifiedTable};
pub use interpret::{Interpretation, InterpretationError, Interpreter, ReadOnlyIntent};
pub use mapper::{
    AcceptedChange, MappingOutcome, ProposedChange, RejectReason, RejectedChange, ValidatedUpdate,
};
pub use resolve::{ReadPlan, RowIdentifier};
pub use snapshot::{ConfirmedSnapshot, RelatedRowSet, RowSnapshot};
pub use statement::Statement;
pub use value::{ColumnType, SqlValue};
