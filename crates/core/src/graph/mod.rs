#![forbid(unsafe_code)]

mod build;
mod label;
mod shared;
mod types;

pub use label::normalize_label;
pub use shared::SharedGraph;
pub use types::*;

use crate::ids::QualifiedTable;
use std::collections::BTreeMap;

/// Tables, columns and foreign keys, plus the traversal policy declared for
/// each root table. Immutable once built; see [`SharedGraph`] for reloads.
#[derive(Clone, Debug)]
pub struct RelationshipGraph {
    tables: Vec<Table>,
    index: BTreeMap<String, usize>,
    edges: Vec<ForeignKey>,
    roots: BTreeMap<String, TraversalPolicy>,
}

impl RelationshipGraph {
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn edges(&self) -> &[ForeignKey] {
        &self.edges
    }

    /// Lookup by full name (`schema.table`, or `table` for the main schema).
    pub fn table(&self, name: &str) -> Option<&Table> {
        let key = name.trim().to_ascii_lowercase();
        self.index.get(&key).map(|i| &self.tables[*i])
    }

    pub fn table_of(&self, name: &QualifiedTable) -> Option<&Table> {
        self.index.get(&name.key()).map(|i| &self.tables[*i])
    }

    /// Every table whose full or bare name matches.
    pub fn find_tables(&self, name: &str) -> Vec<&Table> {
        self.tables.iter().filter(|t| t.name.matches(name)).collect()
    }

    pub fn resolve_column(&self, table: &QualifiedTable, label: &str) -> Option<&Column> {
        self.table_of(table)?.resolve_column(label)
    }

    /// Outgoing and incoming edges of `table`, in declaration order.
    pub fn edges_from(&self, table: &QualifiedTable) -> Vec<EdgeRef<'_>> {
        let mut out = Vec::new();
        for edge in &self.edges {
            if &edge.source == table {
                out.push(EdgeRef {
                    edge,
                    direction: EdgeDirection::Outgoing,
                });
            }
            if &edge.target == table {
                out.push(EdgeRef {
                    edge,
                    direction: EdgeDirection::Incoming,
                });
            }
        }
        out
    }

    pub fn traversal_policy(&self, table: &QualifiedTable) -> Option<TraversalPolicy> {
        self.roots.get(&table.key()).copied()
    }

    /// True when `child` holds a foreign key into `parent`.
    pub fn references(&self, child: &QualifiedTable, parent: &QualifiedTable) -> bool {
        self.edges
            .iter()
            .any(|e| &e.source == child && &e.target == parent)
    }
}
