#![forbid(unsafe_code)]

use crate::error::CoreError;
use crate::graph::{Column, RelationshipGraph, Table};
use crate::ids::QualifiedTable;
use crate::mapper::ValidatedUpdate;
use crate::resolve::ReadTarget;
use crate::value::SqlValue;
use std::collections::BTreeMap;

/// Statement text plus its bound parameters.
///
/// Only this module builds statements: identifiers come from the graph as
/// [`crate::ids::Ident`] and are the only thing ever written into `sql`;
/// everything else is a positional `?N` parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<SqlValue>,
}

impl Statement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

/// `SELECT <declared columns> FROM t WHERE match IN (...) ORDER BY pk`.
/// Returns `None` when there is nothing to match (for example a null
/// foreign key on the parent row).
pub fn build_select(
    graph: &RelationshipGraph,
    target: &ReadTarget,
    values: &[SqlValue],
) -> Result<Option<Statement>, CoreError> {
    let table = graph
        .table_of(&target.table)
        .ok_or_else(|| CoreError::UnknownTable(target.table.to_string()))?;

    let values: Vec<SqlValue> = values.iter().filter(|v| !v.is_null()).cloned().collect();
    if values.is_empty() {
        return Ok(None);
    }

    let columns = table
        .columns()
        .iter()
        .map(|c| c.name().quoted())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=values.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "SELECT {columns} FROM {} WHERE {} IN ({placeholders}) ORDER BY {}",
        table.name().sql(),
        target.match_column.quoted(),
        table.primary_key().name().quoted(),
    );

    Ok(Some(Statement {
        sql,
        params: values,
    }))
}

struct RowUpdate<'a> {
    table: &'a Table,
    row_key: &'a SqlValue,
    assignments: Vec<(&'a Column, &'a SqlValue)>,
}

/// One `UPDATE` per touched row, parents before children.
pub fn build_updates(
    graph: &RelationshipGraph,
    updates: &[ValidatedUpdate],
) -> Result<Vec<Statement>, CoreError> {
    let mut rows: Vec<RowUpdate<'_>> = Vec::new();

    for update in updates {
        let table = graph
            .table_of(update.table())
            .ok_or_else(|| CoreError::UnknownTable(update.table().to_string()))?;
        let column = table
            .column(update.column().as_str())
            .ok_or_else(|| CoreError::UnknownColumn {
                table: table.name().to_string(),
                column: update.column().to_string(),
            })?;
        column
            .column_type()
            .check_bound(update.value(), column.nullable())
            .map_err(|source| CoreError::UnsupportedType {
                column: table.name().column_key(column.name()),
                source,
            })?;

        match rows
            .iter_mut()
            .find(|r| r.table.name() == table.name() && r.row_key == update.row_key())
        {
            Some(row) => row.assignments.push((column, update.value())),
            None => rows.push(RowUpdate {
                table,
                row_key: update.row_key(),
                assignments: vec![(column, update.value())],
            }),
        }
    }

    let mut statements = Vec::with_capacity(rows.len());
    for table in parent_first(graph, &rows) {
        for row in rows.iter().filter(|r| r.table.name() == &table) {
            statements.push(update_statement(row));
        }
    }
    Ok(statements)
}

fn update_statement(row: &RowUpdate<'_>) -> Statement {
    let mut params = Vec::with_capacity(row.assignments.len() + 1);
    let mut sets = Vec::with_capacity(row.assignments.len());
    for (column, value) in &row.assignments {
        params.push((*value).clone());
        sets.push(format!("{} = ?{}", column.name().quoted(), params.len()));
    }
    params.push(row.row_key.clone());

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        row.table.name().sql(),
        sets.join(", "),
        row.table.primary_key().name().quoted(),
        params.len(),
    );
    Statement { sql, params }
}

/// Orders the touched tables so a referenced table comes before the tables
/// referencing it. Unrelated tables fall back to name order; a reference
/// cycle keeps name order for the tables involved.
fn parent_first(graph: &RelationshipGraph, rows: &[RowUpdate<'_>]) -> Vec<QualifiedTable> {
    let mut pending: BTreeMap<String, QualifiedTable> = rows
        .iter()
        .map(|r| (r.table.name().key(), r.table.name().clone()))
        .collect();
    let mut ordered = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let ready = pending
            .iter()
            .find(|(_, table)| {
                !pending
                    .values()
                    .any(|other| other != *table && graph.references(table, other))
            })
            .map(|(key, _)| key.clone());

        match ready {
            Some(key) => {
                if let Some(table) = pending.remove(&key) {
                    ordered.push(table);
                }
            }
            None => {
                ordered.extend(std::mem::take(&mut pending).into_values());
            }
        }
    }
    ordered
}
