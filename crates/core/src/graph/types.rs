#![forbid(unsafe_code)]

use super::label::normalize_label;
use crate::ids::{Ident, QualifiedTable};
use crate::value::ColumnType;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct Column {
    pub(super) name: Ident,
    pub(super) column_type: ColumnType,
    pub(super) nullable: bool,
    /// Normalized alias labels.
    pub(super) aliases: Vec<String>,
}

impl Column {
    pub fn name(&self) -> &Ident {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub(crate) fn answers_to(&self, normalized: &str) -> bool {
        normalize_label(self.name.as_str()) == normalized
            || self.aliases.iter().any(|alias| alias == normalized)
    }
}

#[derive(Clone, Debug)]
pub struct Table {
    pub(super) name: QualifiedTable,
    pub(super) primary_key: usize,
    pub(super) columns: Vec<Column>,
}

impl Table {
    pub fn name(&self) -> &QualifiedTable {
        &self.name
    }

    pub fn primary_key(&self) -> &Column {
        &self.columns[self.primary_key]
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Exact (case-insensitive) column name lookup.
    pub fn column(&self, name: &str) -> Option<&Column> {
        let name = name.trim();
        self.columns.iter().find(|c| c.name.eq_ignore_case(name))
    }

    /// Label lookup: column name or declared alias, after normalization.
    pub fn resolve_column(&self, label: &str) -> Option<&Column> {
        let normalized = normalize_label(label);
        if normalized.is_empty() {
            return None;
        }
        self.columns.iter().find(|c| c.answers_to(&normalized))
    }

    pub fn is_primary_key(&self, column: &Column) -> bool {
        self.primary_key().name == column.name
    }
}

/// `source.source_column -> target.target_column`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignKey {
    pub(super) source: QualifiedTable,
    pub(super) source_column: Ident,
    pub(super) target: QualifiedTable,
    pub(super) target_column: Ident,
}

impl ForeignKey {
    pub fn source(&self) -> &QualifiedTable {
        &self.source
    }

    pub fn source_column(&self) -> &Ident {
        &self.source_column
    }

    pub fn target(&self) -> &QualifiedTable {
        &self.target
    }

    pub fn target_column(&self) -> &Ident {
        &self.target_column
    }
}

/// Which edges a root's traversal may follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Rows this row references.
    Outgoing,
    /// Rows that reference this row.
    Incoming,
    Both,
}

impl Direction {
    pub fn allows(self, edge: EdgeDirection) -> bool {
        match self {
            Self::Both => true,
            Self::Outgoing => edge == EdgeDirection::Outgoing,
            Self::Incoming => edge == EdgeDirection::Incoming,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeDirection {
    Outgoing,
    Incoming,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraversalPolicy {
    pub depth: usize,
    pub direction: Direction,
}

/// A foreign key seen from one of its endpoint tables.
#[derive(Clone, Copy, Debug)]
pub struct EdgeRef<'a> {
    pub edge: &'a ForeignKey,
    pub direction: EdgeDirection,
}

impl<'a> EdgeRef<'a> {
    pub fn local_column(&self) -> &'a Ident {
        match self.direction {
            EdgeDirection::Outgoing => &self.edge.source_column,
            EdgeDirection::Incoming => &self.edge.target_column,
        }
    }

    pub fn remote_table(&self) -> &'a QualifiedTable {
        match self.direction {
            EdgeDirection::Outgoing => &self.edge.target,
            EdgeDirection::Incoming => &self.edge.source,
        }
    }

    pub fn remote_column(&self) -> &'a Ident {
        match self.direction {
            EdgeDirection::Outgoing => &self.edge.target_column,
            EdgeDirection::Incoming => &self.edge.source_column,
        }
    }
}
