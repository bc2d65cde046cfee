#![forbid(unsafe_code)]

use super::{RelationalStore, StoreError};
use tc_core::mapper::{FieldAnswer, UnresolvedField, answer_fields, map_changes};
use tc_core::{
    AcceptedChange, ConfirmedSnapshot, Interpretation, Interpreter, ProposedChange, ReadPlan,
    RejectedChange, RelatedRowSet, RelationshipGraph, RowIdentifier,
};
use tracing::{info, instrument, warn};

/// Result of a write round.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateReport {
    /// Related rows as read before interpretation.
    pub before: RelatedRowSet,
    pub confirmed: ConfirmedSnapshot,
    pub accepted: Vec<AcceptedChange>,
    pub rejected: Vec<RejectedChange>,
}

/// Result of a read-only round.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryReport {
    pub snapshot: RelatedRowSet,
    pub answers: Vec<FieldAnswer>,
    pub unresolved: Vec<UnresolvedField>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessageOutcome {
    Updated(UpdateReport),
    Answered(QueryReport),
}

impl RelationalStore {
    /// Maps `changes` against the identifier's related rows and applies the
    /// accepted ones.
    #[instrument(skip_all, fields(identifier = %identifier, changes = changes.len()))]
    pub fn submit_changes(
        &mut self,
        graph: &RelationshipGraph,
        identifier: &RowIdentifier,
        changes: &[ProposedChange],
    ) -> Result<UpdateReport, StoreError> {
        let (plan, before) = self.fetch_related(graph, identifier)?;
        self.write_round(graph, &plan, before, changes)
    }

    /// Read, interpret, map, write and re-read for one user message.
    /// An interpretation failure aborts before anything is written.
    #[instrument(skip_all, fields(identifier = %identifier))]
    pub fn process_message(
        &mut self,
        graph: &RelationshipGraph,
        identifier: &RowIdentifier,
        message: &str,
        interpreter: &mut dyn Interpreter,
    ) -> Result<MessageOutcome, StoreError> {
        let (plan, before) = self.fetch_related(graph, identifier)?;
        let interpretation = interpreter.interpret(&before, message).map_err(|err| {
            warn!(%err, "interpretation rejected");
            StoreError::InterpretationFailed(err)
        })?;

        match interpretation {
            Interpretation::Changes(changes) => self
                .write_round(graph, &plan, before, &changes)
                .map(MessageOutcome::Updated),
            Interpretation::Query(intent) => {
                let (answers, unresolved) = answer_fields(graph, &before, &intent.fields);
                info!(
                    answered = answers.len(),
                    unresolved = unresolved.len(),
                    "read-only request"
                );
                Ok(MessageOutcome::Answered(QueryReport {
                    snapshot: before,
                    answers,
                    unresolved,
                }))
            }
        }
    }

    fn write_round(
        &mut self,
        graph: &RelationshipGraph,
        plan: &ReadPlan,
        before: RelatedRowSet,
        changes: &[ProposedChange],
    ) -> Result<UpdateReport, StoreError> {
        let outcome = map_changes(graph, &before, changes);
        for rejected in &outcome.rejected {
            warn!(field = %rejected.field, reason = %rejected.reason, "change rejected");
        }
        info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "changes mapped"
        );

        let confirmed = self.apply(graph, plan, &outcome.accepted)?;
        Ok(UpdateReport {
            before,
            confirmed,
            accepted: outcome.accepted.iter().map(|u| u.report()).collect(),
            rejected: outcome.rejected,
        })
    }
}
