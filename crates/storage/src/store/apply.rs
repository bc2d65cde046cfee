#![forbid(unsafe_code)]

use super::bind::to_sql;
use super::read::read_plan;
use super::{RelationalStore, StoreError};
use rusqlite::params_from_iter;
use tc_core::statement::build_updates;
use tc_core::{ConfirmedSnapshot, ReadPlan, RelationshipGraph, ValidatedUpdate};
use tracing::{debug, info, instrument, warn};

impl RelationalStore {
    /// Applies every update in one transaction, then re-reads `plan`.
    ///
    /// Each `UPDATE` must touch exactly one row. Any failure drops the
    /// transaction uncommitted and returns [`StoreError::CommitFailed`].
    #[instrument(skip_all, fields(identifier = %plan.identifier(), updates = updates.len()))]
    pub fn apply(
        &mut self,
        graph: &RelationshipGraph,
        plan: &ReadPlan,
        updates: &[ValidatedUpdate],
    ) -> Result<ConfirmedSnapshot, StoreError> {
        let statements = build_updates(graph, updates)?;
        if statements.is_empty() {
            debug!("nothing to write");
            return read_plan(&self.conn, graph, plan);
        }

        let tx = self.conn.transaction()?;
        for statement in &statements {
            debug!(
                sql = statement.sql(),
                params = statement.params().len(),
                "update"
            );
            let affected = tx
                .execute(
                    statement.sql(),
                    params_from_iter(statement.params().iter().map(to_sql)),
                )
                .map_err(|err| rolled_back(err.to_string()))?;
            if affected != 1 {
                return Err(rolled_back(format!(
                    "expected one row, {affected} affected by: {}",
                    statement.sql()
                )));
            }
        }
        tx.commit().map_err(|err| rolled_back(err.to_string()))?;
        info!(statements = statements.len(), "committed");

        read_plan(&self.conn, graph, plan)
    }
}

fn rolled_back(reason: String) -> StoreError {
    warn!(%reason, "rolling back");
    StoreError::CommitFailed { reason }
}
