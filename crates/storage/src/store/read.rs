#![forbid(unsafe_code)]

use super::bind::{from_sql, to_sql};
use super::{RelationalStore, StoreError};
use rusqlite::{Connection, params_from_iter};
use tc_core::graph::Table;
use tc_core::resolve::{ReadSource, resolve};
use tc_core::statement::{Statement, build_select};
use tc_core::{
    CoreError, Ident, ReadPlan, RelatedRowSet, RelationshipGraph, RowIdentifier, RowSnapshot,
    SqlValue,
};
use tracing::{debug, instrument};

impl RelationalStore {
    /// Resolves `identifier` and reads its related rows.
    #[instrument(skip_all, fields(identifier = %identifier))]
    pub fn fetch_related(
        &self,
        graph: &RelationshipGraph,
        identifier: &RowIdentifier,
    ) -> Result<(ReadPlan, RelatedRowSet), StoreError> {
        let plan = resolve(graph, identifier)?;
        let related = read_plan(&self.conn, graph, &plan)?;
        Ok((plan, related))
    }

    pub fn read_plan(
        &self,
        graph: &RelationshipGraph,
        plan: &ReadPlan,
    ) -> Result<RelatedRowSet, StoreError> {
        read_plan(&self.conn, graph, plan)
    }
}

/// Executes the plan's selects in order. Rows of each target are kept raw so
/// later targets can match on their parent's column values; targets that
/// read the same table are merged into one entry of the set.
pub(crate) fn read_plan(
    conn: &Connection,
    graph: &RelationshipGraph,
    plan: &ReadPlan,
) -> Result<RelatedRowSet, StoreError> {
    let mut raw: Vec<Vec<Vec<SqlValue>>> = Vec::with_capacity(plan.targets().len());
    let mut related = RelatedRowSet::new();

    for (position, target) in plan.targets().iter().enumerate() {
        let table = table_of(graph, &target.table)?;

        let values = match &target.source {
            ReadSource::Start(value) => vec![value.clone()],
            ReadSource::Parent {
                target: parent_target,
                table: parent,
                column,
            } => {
                let index = column_index(table_of(graph, parent)?, column)?;
                let mut values: Vec<SqlValue> = Vec::new();
                for row in raw.get(*parent_target).map(Vec::as_slice).unwrap_or(&[]) {
                    if !values.contains(&row[index]) {
                        values.push(row[index].clone());
                    }
                }
                values
            }
        };

        let rows = match build_select(graph, target, &values)? {
            Some(statement) => query_rows(conn, &statement, table.columns().len())?,
            None => Vec::new(),
        };

        if position == 0 && rows.len() != 1 {
            let identifier = plan.identifier().to_string();
            return Err(match rows.len() {
                0 => StoreError::RowNotFound { identifier },
                n => StoreError::AmbiguousIdentifier {
                    identifier,
                    rows: n,
                },
            });
        }

        let key_index = column_index(table, table.primary_key().name())?;
        let snapshots = rows
            .iter()
            .map(|row| {
                let values = table
                    .columns()
                    .iter()
                    .zip(row)
                    .map(|(column, value)| {
                        (
                            table.name().column_key(column.name()),
                            column.column_type().decode(value),
                        )
                    })
                    .collect();
                RowSnapshot::new(row[key_index].clone(), values)
            })
            .collect();

        related.push(target.table.clone(), snapshots);
        raw.push(rows);
    }

    Ok(related)
}

fn query_rows(
    conn: &Connection,
    statement: &Statement,
    width: usize,
) -> Result<Vec<Vec<SqlValue>>, StoreError> {
    debug!(
        sql = statement.sql(),
        params = statement.params().len(),
        "select"
    );
    let mut prepared = conn.prepare(statement.sql())?;
    let mut rows = prepared.query(params_from_iter(statement.params().iter().map(to_sql)))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for index in 0..width {
            values.push(from_sql(row.get_ref(index)?));
        }
        out.push(values);
    }
    Ok(out)
}

fn table_of<'a>(
    graph: &'a RelationshipGraph,
    name: &tc_core::QualifiedTable,
) -> Result<&'a Table, CoreError> {
    graph
        .table_of(name)
        .ok_or_else(|| CoreError::UnknownTable(name.to_string()))
}

fn column_index(table: &Table, column: &Ident) -> Result<usize, CoreError> {
    table
        .columns()
        .iter()
        .position(|c| c.name().eq_ignore_case(column.as_str()))
        .ok_or_else(|| CoreError::UnknownColumn {
            table: table.name().to_string(),
            column: column.to_string(),
        })
}
