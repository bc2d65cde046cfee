#![forbid(unsafe_code)]

use serde::Serialize;
use serde_json::Value;
use tc_core::mapper::{FieldAnswer, UnresolvedField};
use tc_core::{AcceptedChange, RejectedChange, RelatedRowSet, RelationshipGraph};
use tc_storage::{MessageOutcome, QueryReport, UpdateReport};

#[derive(Serialize)]
struct ChangeView<'a> {
    field: &'a str,
    column: Option<&'a str>,
    value: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl<'a> ChangeView<'a> {
    fn accepted(change: &'a AcceptedChange) -> Self {
        Self {
            field: &change.field,
            column: Some(&change.column),
            value: &change.value,
            reason: None,
        }
    }

    fn rejected(change: &'a RejectedChange) -> Self {
        Self {
            field: &change.field,
            column: None,
            value: &change.value,
            reason: Some(change.reason.to_string()),
        }
    }
}

#[derive(Serialize)]
struct UpdateView<'a> {
    kind: &'static str,
    accepted: Vec<ChangeView<'a>>,
    rejected: Vec<ChangeView<'a>>,
    snapshot: Value,
}

#[derive(Serialize)]
struct AnswerView<'a> {
    field: &'a str,
    column: &'a str,
    values: &'a [Value],
}

#[derive(Serialize)]
struct UnresolvedView<'a> {
    field: &'a str,
    reason: String,
}

#[derive(Serialize)]
struct QueryView<'a> {
    kind: &'static str,
    answers: Vec<AnswerView<'a>>,
    unresolved: Vec<UnresolvedView<'a>>,
    snapshot: Value,
}

pub(crate) fn report_json(outcome: &MessageOutcome) -> Value {
    let view = match outcome {
        MessageOutcome::Updated(report) => serde_json::to_value(update_view(report)),
        MessageOutcome::Answered(report) => serde_json::to_value(query_view(report)),
    };
    view.unwrap_or(Value::Null)
}

fn update_view(report: &UpdateReport) -> UpdateView<'_> {
    UpdateView {
        kind: "updated",
        accepted: report.accepted.iter().map(ChangeView::accepted).collect(),
        rejected: report.rejected.iter().map(ChangeView::rejected).collect(),
        snapshot: report.confirmed.to_json(),
    }
}

fn query_view(report: &QueryReport) -> QueryView<'_> {
    QueryView {
        kind: "answered",
        answers: report
            .answers
            .iter()
            .map(|a: &FieldAnswer| AnswerView {
                field: &a.field,
                column: &a.column,
                values: &a.values,
            })
            .collect(),
        unresolved: report
            .unresolved
            .iter()
            .map(|u: &UnresolvedField| UnresolvedView {
                field: &u.field,
                reason: u.reason.to_string(),
            })
            .collect(),
        snapshot: report.snapshot.to_json(),
    }
}

/// `return_date` -> `Return date`.
pub(crate) fn humanize(column: &str) -> String {
    let spaced = column.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "not set".to_string(),
        Value::String(text) => text.clone(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        other => other.to_string(),
    }
}

/// `(label, value)` for every non-null value of single-row tables. Column
/// names that occur in more than one table are prefixed with their table name.
fn labelled_values(snapshot: &RelatedRowSet) -> Vec<(String, String)> {
    let pairs: Vec<(&str, &str, &Value)> = snapshot
        .tables()
        .iter()
        .filter(|t| t.rows.len() == 1)
        .flat_map(|t| t.rows[0].values().iter())
        .filter(|(_, value)| !value.is_null())
        .filter_map(|(key, value)| {
            let mut parts = key.rsplitn(3, '.');
            let column = parts.next()?;
            let table = parts.next()?;
            Some((table, column, value))
        })
        .collect();

    pairs
        .iter()
        .map(|(table, column, value)| {
            let shared = pairs
                .iter()
                .filter(|(_, other, _)| other.eq_ignore_ascii_case(column))
                .count()
                > 1;
            let label = if shared {
                humanize(&format!("{table} {column}"))
            } else {
                humanize(column)
            };
            (label, display_value(value))
        })
        .collect()
}

/// Plain-language confirmation of what is on record now.
pub(crate) fn confirmation_text(outcome: &MessageOutcome) -> String {
    match outcome {
        MessageOutcome::Updated(report) => {
            let mut text = String::from("I have now in my records the following:");
            for (label, value) in labelled_values(&report.confirmed) {
                text.push_str(&format!(" {label} is {value}."));
            }
            if !report.rejected.is_empty() {
                let fields: Vec<&str> = report.rejected.iter().map(|r| r.field.as_str()).collect();
                text.push_str(&format!(
                    " I could not apply: {}.",
                    fields.join(", ")
                ));
            }
            text.push_str(
                " If you need modifications, please state them. \
Otherwise, we thank you for completing your record.",
            );
            text
        }
        MessageOutcome::Answered(report) => {
            let mut parts = Vec::new();
            for answer in &report.answers {
                let column = answer.column.rsplit('.').next().unwrap_or(&answer.column);
                let values: Vec<String> = answer.values.iter().map(display_value).collect();
                let shown = if values.is_empty() {
                    "not on record".to_string()
                } else {
                    values.join(", ")
                };
                parts.push(format!("{} is {shown}.", humanize(column)));
            }
            if !report.unresolved.is_empty() {
                let fields: Vec<&str> = report.unresolved.iter().map(|u| u.field.as_str()).collect();
                parts.push(format!("I could not find: {}.", fields.join(", ")));
            }
            parts.join(" ")
        }
    }
}

/// Tables, edges and roots of the loaded graph.
pub(crate) fn graph_summary(graph: &RelationshipGraph) -> Value {
    let tables: Vec<Value> = graph
        .tables()
        .iter()
        .map(|table| {
            let policy = graph.traversal_policy(table.name());
            serde_json::json!({
                "table": table.name().to_string(),
                "primary_key": table.primary_key().name().to_string(),
                "columns": table.columns().len(),
                "root": policy.map(|p| serde_json::json!({
                    "depth": p.depth,
                    "direction": p.direction,
                })),
            })
        })
        .collect();
    let edges: Vec<String> = graph
        .edges()
        .iter()
        .map(|edge| {
            format!(
                "{} -> {}",
                edge.source().column_key(edge.source_column()),
                edge.target().column_key(edge.target_column())
            )
        })
        .collect();
    serde_json::json!({ "tables": tables, "foreign_keys": edges })
}
