#![forbid(unsafe_code)]

use crate::mapper::ProposedChange;
use crate::snapshot::RelatedRowSet;
use serde::Deserialize;
use serde_json::{Map, Value};

/// What the interpretation step made of a message.
#[derive(Clone, Debug, PartialEq)]
pub enum Interpretation {
    Changes(Vec<ProposedChange>),
    Query(ReadOnlyIntent),
}

/// A question about current values; nothing is written.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadOnlyIntent {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("interpretation failed: {0}")]
pub struct InterpretationError(pub String);

impl InterpretationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Turns free text plus the current related rows into an interpretation.
/// Implementations are untrusted: whatever they return still goes through
/// the change mapper.
pub trait Interpreter {
    fn interpret(
        &mut self,
        current: &RelatedRowSet,
        message: &str,
    ) -> Result<Interpretation, InterpretationError>;
}

impl<F> Interpreter for F
where
    F: FnMut(&RelatedRowSet, &str) -> Result<Interpretation, InterpretationError>,
{
    fn interpret(
        &mut self,
        current: &RelatedRowSet,
        message: &str,
    ) -> Result<Interpretation, InterpretationError> {
        self(current, message)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawChange {
    field: String,
    value: Value,
}

/// Parses an interpreter reply.
///
/// Accepted shapes (exactly one top-level key):
/// - `{"changes": [{"field": "...", "value": ...}, ...]}`
/// - `{"query": {"fields": ["...", ...]}}`
/// - `{"record": {"schema.table.column": value, ...}}`, a full edited record;
///   only entries that differ from `current` become proposed changes.
///
/// A fenced code block around the JSON is tolerated.
pub fn parse_interpretation(
    text: &str,
    current: &RelatedRowSet,
) -> Result<Interpretation, InterpretationError> {
    let text = strip_code_fence(text);
    if text.is_empty() {
        return Err(InterpretationError::new("empty reply"));
    }
    let value: Value = serde_json::from_str(text)
        .map_err(|err| InterpretationError::new(format!("reply is not JSON: {err}")))?;
    interpretation_from_value(value, current)
}

pub fn interpretation_from_value(
    value: Value,
    current: &RelatedRowSet,
) -> Result<Interpretation, InterpretationError> {
    let Value::Object(mut object) = value else {
        return Err(InterpretationError::new("reply must be a JSON object"));
    };
    if object.len() != 1 {
        return Err(InterpretationError::new(
            "reply must have exactly one of: changes, query, record",
        ));
    }

    if let Some(changes) = object.remove("changes") {
        let raw: Vec<RawChange> = serde_json::from_value(changes)
            .map_err(|err| InterpretationError::new(format!("changes: {err}")))?;
        let mut out = Vec::with_capacity(raw.len());
        for change in raw {
            if change.field.trim().is_empty() {
                return Err(InterpretationError::new("changes: empty field label"));
            }
            out.push(ProposedChange::new(change.field, change.value));
        }
        return Ok(Interpretation::Changes(out));
    }

    if let Some(query) = object.remove("query") {
        let intent: ReadOnlyIntent = serde_json::from_value(query)
            .map_err(|err| InterpretationError::new(format!("query: {err}")))?;
        if intent.fields.iter().any(|f| f.trim().is_empty()) {
            return Err(InterpretationError::new("query: empty field label"));
        }
        return Ok(Interpretation::Query(intent));
    }

    if let Some(record) = object.remove("record") {
        let Value::Object(record) = record else {
            return Err(InterpretationError::new("record must be a JSON object"));
        };
        return Ok(Interpretation::Changes(diff_record(record, current)));
    }

    Err(InterpretationError::new(
        "reply must have exactly one of: changes, query, record",
    ))
}

fn diff_record(record: Map<String, Value>, current: &RelatedRowSet) -> Vec<ProposedChange> {
    record
        .into_iter()
        .filter(|(field, value)| current.single_value(field) != Some(value))
        .map(|(field, value)| ProposedChange::new(field, value))
        .collect()
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
