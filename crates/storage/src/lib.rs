#![forbid(unsafe_code)]

//! SQLite execution for tablechat: reads the related rows of an identifier,
//! applies validated updates in one transaction and drives a full message
//! round through an [`tc_core::Interpreter`].

mod store;

pub use store::{MessageOutcome, QueryReport, RelationalStore, StoreError, UpdateReport};
