#![forbid(unsafe_code)]

use crate::error::CoreError;
use crate::graph::{ForeignKey, RelationshipGraph};
use crate::ids::{Ident, QualifiedTable};
use crate::value::SqlValue;
use serde_json::Value;
use std::fmt;

/// Names exactly one row: `table.column = value`. Supplied per request.
#[derive(Clone, Debug, PartialEq)]
pub struct RowIdentifier {
    pub table: String,
    pub column: String,
    pub value: Value,
}

impl RowIdentifier {
    pub fn new(table: impl Into<String>, column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for RowIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} = {}", self.table, self.column, self.value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReadSource {
    /// The starting identifier's value.
    Start(SqlValue),
    /// Values of `column` across the rows fetched by the earlier target at
    /// position `target`, which reads `table`.
    Parent {
        target: usize,
        table: QualifiedTable,
        column: Ident,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReadTarget {
    pub table: QualifiedTable,
    pub match_column: Ident,
    pub source: ReadSource,
    /// Hops from the root (0 for the root itself).
    pub depth: usize,
}

/// Read targets in execution order; every `Parent` source refers to a
/// target earlier in the list.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadPlan {
    identifier: RowIdentifier,
    targets: Vec<ReadTarget>,
}

impl ReadPlan {
    pub fn identifier(&self) -> &RowIdentifier {
        &self.identifier
    }

    pub fn targets(&self) -> &[ReadTarget] {
        &self.targets
    }

    pub fn root(&self) -> &ReadTarget {
        &self.targets[0]
    }
}

/// Walks the graph breadth-first from the identifier's table, following only
/// the edges the root's declared policy allows, up to its declared depth.
/// Each foreign key is followed once, so two keys into the same table give
/// two targets whose rows end up merged under that table.
pub fn resolve(graph: &RelationshipGraph, identifier: &RowIdentifier) -> Result<ReadPlan, CoreError> {
    let table = graph
        .table(&identifier.table)
        .ok_or_else(|| CoreError::UnknownTable(identifier.table.clone()))?;

    // Accept `table.column` as well as a bare column name.
    let column_name = identifier
        .column
        .rsplit('.')
        .next()
        .unwrap_or(identifier.column.as_str());
    let column = table
        .column(column_name)
        .ok_or_else(|| CoreError::UnknownColumn {
            table: table.name().to_string(),
            column: identifier.column.clone(),
        })?;

    let policy = graph
        .traversal_policy(table.name())
        .ok_or_else(|| CoreError::MissingTraversalPolicy(table.name().to_string()))?;

    let start_value = column
        .column_type()
        .coerce(&identifier.value, false)
        .map_err(|source| CoreError::InvalidIdentifierValue {
            column: table.name().column_key(column.name()),
            source,
        })?;

    let mut targets = vec![ReadTarget {
        table: table.name().clone(),
        match_column: column.name().clone(),
        source: ReadSource::Start(start_value),
        depth: 0,
    }];
    let mut followed: Vec<&ForeignKey> = Vec::new();
    let mut frontier = vec![0];

    for depth in 1..=policy.depth {
        let mut next = Vec::new();
        for &current in &frontier {
            let parent = targets[current].table.clone();
            for edge in graph.edges_from(&parent) {
                if !policy.direction.allows(edge.direction) || followed.contains(&edge.edge) {
                    continue;
                }
                followed.push(edge.edge);
                targets.push(ReadTarget {
                    table: edge.remote_table().clone(),
                    match_column: edge.remote_column().clone(),
                    source: ReadSource::Parent {
                        target: current,
                        table: parent.clone(),
                        column: edge.local_column().clone(),
                    },
                    depth,
                });
                next.push(targets.len() - 1);
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    Ok(ReadPlan {
        identifier: identifier.clone(),
        targets,
    })
}
