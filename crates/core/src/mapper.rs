#![forbid(unsafe_code)]

use crate::graph::{Column, RelationshipGraph, Table};
use crate::ids::{Ident, QualifiedTable};
use crate::snapshot::{RelatedRowSet, RowSnapshot};
use crate::value::{ColumnType, SqlValue, TypeError};
use serde_json::Value;

/// Untrusted `(field label, new value)` pair from the interpretation step.
#[derive(Clone, Debug, PartialEq)]
pub struct ProposedChange {
    pub field: String,
    pub value: Value,
}

impl ProposedChange {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A change that resolved to a declared column of a fetched row and whose
/// value was coerced to the column type. Only the mapper creates these.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedUpdate {
    field: String,
    table: QualifiedTable,
    column: Ident,
    column_type: ColumnType,
    row_key: SqlValue,
    value: SqlValue,
}

impl ValidatedUpdate {
    pub(crate) fn new(
        field: String,
        table: QualifiedTable,
        column: &Column,
        row_key: SqlValue,
        value: SqlValue,
    ) -> Self {
        Self {
            field,
            table,
            column: column.name().clone(),
            column_type: column.column_type(),
            row_key,
            value,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn table(&self) -> &QualifiedTable {
        &self.table
    }

    pub fn column(&self) -> &Ident {
        &self.column
    }

    pub fn row_key(&self) -> &SqlValue {
        &self.row_key
    }

    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    pub fn qualified_column(&self) -> String {
        self.table.column_key(&self.column)
    }

    pub fn report(&self) -> AcceptedChange {
        AcceptedChange {
            field: self.field.clone(),
            column: self.qualified_column(),
            value: self.column_type.decode(&self.value),
        }
    }
}

/// Audit view of an accepted change.
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptedChange {
    pub field: String,
    pub column: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RejectReason {
    #[error("no column in the fetched tables matches this field")]
    UnknownField,
    #[error("{table} is not part of this request's related rows")]
    OutsideRelatedSet { table: String },
    #[error("field matches several columns: {}", candidates.join(", "))]
    AmbiguousField { candidates: Vec<String> },
    #[error("{table} has {rows} fetched rows; cannot tell which one to change")]
    AmbiguousRow { table: String, rows: usize },
    #[error("{table} has no fetched row to change")]
    MissingRow { table: String },
    #[error("{column} is a primary key and cannot be changed")]
    KeyColumn { column: String },
    #[error("{column} is already changed by an earlier field in this request")]
    DuplicateTarget { column: String },
    #[error("{column}: {error}")]
    TypeMismatch { column: String, error: TypeError },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RejectedChange {
    pub field: String,
    pub value: Value,
    pub reason: RejectReason,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappingOutcome {
    pub accepted: Vec<ValidatedUpdate>,
    pub rejected: Vec<RejectedChange>,
}

/// A field label resolved against the tables of one related row set.
#[derive(Clone, Copy, Debug)]
pub struct FieldTarget<'a> {
    pub table: &'a Table,
    pub column: &'a Column,
    pub rows: &'a [RowSnapshot],
}

impl FieldTarget<'_> {
    pub fn qualified_column(&self) -> String {
        self.table.name().column_key(self.column.name())
    }
}

/// Resolves `label` to a column of a table present in `related`.
///
/// Labels may be bare (`return date`), table-qualified
/// (`transactions.return_date`) or fully qualified
/// (`library.transactions.return_date`). Tables outside `related` are never
/// a valid target, whatever the graph declares.
pub fn resolve_field<'a>(
    graph: &'a RelationshipGraph,
    related: &'a RelatedRowSet,
    label: &str,
) -> Result<FieldTarget<'a>, RejectReason> {
    let label = label.trim();
    let in_set: Vec<&Table> = related
        .tables()
        .iter()
        .filter_map(|t| graph.table_of(&t.table))
        .collect();
    let target = |table: &'a Table, column: &'a Column| FieldTarget {
        table,
        column,
        rows: related.rows(table.name()).unwrap_or(&[]),
    };

    if let Some((prefix, column_label)) = label.rsplit_once('.') {
        let matches: Vec<&Table> = in_set
            .iter()
            .copied()
            .filter(|t| t.name().matches(prefix))
            .collect();
        match matches.as_slice() {
            [table] => {
                let column = table
                    .resolve_column(column_label)
                    .ok_or(RejectReason::UnknownField)?;
                return Ok(target(*table, column));
            }
            [] => {
                if let Some(outside) = graph.find_tables(prefix).first() {
                    return Err(RejectReason::OutsideRelatedSet {
                        table: outside.name().to_string(),
                    });
                }
            }
            several => {
                return Err(RejectReason::AmbiguousField {
                    candidates: several.iter().map(|t| t.name().to_string()).collect(),
                });
            }
        }
    }

    let hits: Vec<(&Table, &Column)> = in_set
        .iter()
        .filter_map(|t| t.resolve_column(label).map(|c| (*t, c)))
        .collect();
    match hits.as_slice() {
        [(table, column)] => Ok(target(*table, *column)),
        [] => {
            let outside = graph.tables().iter().find(|t| {
                !in_set.iter().any(|s| s.name() == t.name()) && t.resolve_column(label).is_some()
            });
            match outside {
                Some(table) => Err(RejectReason::OutsideRelatedSet {
                    table: table.name().to_string(),
                }),
                None => Err(RejectReason::UnknownField),
            }
        }
        several => Err(RejectReason::AmbiguousField {
            candidates: several
                .iter()
                .map(|(t, c)| t.name().column_key(c.name()))
                .collect(),
        }),
    }
}

/// Splits proposed changes into validated updates and rejections, both in
/// input order. A rejection never stops the other changes.
pub fn map_changes(
    graph: &RelationshipGraph,
    related: &RelatedRowSet,
    changes: &[ProposedChange],
) -> MappingOutcome {
    let mut outcome = MappingOutcome::default();

    for change in changes {
        match map_one(graph, related, change, &outcome.accepted) {
            Ok(update) => outcome.accepted.push(update),
            Err(reason) => outcome.rejected.push(RejectedChange {
                field: change.field.clone(),
                value: change.value.clone(),
                reason,
            }),
        }
    }
    outcome
}

fn map_one(
    graph: &RelationshipGraph,
    related: &RelatedRowSet,
    change: &ProposedChange,
    accepted: &[ValidatedUpdate],
) -> Result<ValidatedUpdate, RejectReason> {
    let target = resolve_field(graph, related, &change.field)?;
    let column_key = target.qualified_column();

    if target.table.is_primary_key(target.column) {
        return Err(RejectReason::KeyColumn { column: column_key });
    }

    let row = match target.rows {
        [row] => row,
        [] => {
            return Err(RejectReason::MissingRow {
                table: target.table.name().to_string(),
            });
        }
        rows => {
            return Err(RejectReason::AmbiguousRow {
                table: target.table.name().to_string(),
                rows: rows.len(),
            });
        }
    };

    if accepted.iter().any(|u| {
        u.table == *target.table.name() && u.column == *target.column.name() && u.row_key == *row.key()
    }) {
        return Err(RejectReason::DuplicateTarget { column: column_key });
    }

    let value = target
        .column
        .column_type()
        .coerce(&change.value, target.column.nullable())
        .map_err(|error| RejectReason::TypeMismatch {
            column: column_key,
            error,
        })?;

    Ok(ValidatedUpdate::new(
        change.field.clone(),
        target.table.name().clone(),
        target.column,
        row.key().clone(),
        value,
    ))
}

/// Current values for a read-only question.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldAnswer {
    pub field: String,
    pub column: String,
    /// One value per fetched row of the column's table.
    pub values: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnresolvedField {
    pub field: String,
    pub reason: RejectReason,
}

/// Resolves each requested field the same way changes are resolved and
/// reads its current values. Nothing is written.
pub fn answer_fields(
    graph: &RelationshipGraph,
    related: &RelatedRowSet,
    fields: &[String],
) -> (Vec<FieldAnswer>, Vec<UnresolvedField>) {
    let mut answers = Vec::new();
    let mut unresolved = Vec::new();
    for field in fields {
        match resolve_field(graph, related, field) {
            Ok(target) => {
                let column = target.qualified_column();
                let values = target
                    .rows
                    .iter()
                    .map(|row| row.get(&column).cloned().unwrap_or(Value::Null))
                    .collect();
                answers.push(FieldAnswer {
                    field: field.clone(),
                    column,
                    values,
                });
            }
            Err(reason) => unresolved.push(UnresolvedField {
                field: field.clone(),
                reason,
            }),
        }
    }
    (answers, unresolved)
}
