#![forbid(unsafe_code)]

use tc_core::{RelatedRowSet, RelationshipGraph};

const MAX_MESSAGE_CHARS: usize = 2_000;

pub(crate) fn sanitize_single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect::<String>()
}

pub(crate) fn truncate_for_prompt(text: &str, max_chars: usize) -> String {
    let sanitized = sanitize_single_line(text).trim().to_string();
    if sanitized.chars().count() <= max_chars {
        return sanitized;
    }
    let mut out: String = sanitized.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

/// Column catalogue for the tables present in `current`; primary keys are
/// left out since they can never be changed.
pub(crate) fn render_columns(graph: &RelationshipGraph, current: &RelatedRowSet) -> String {
    let mut lines = Vec::new();
    for entry in current.tables() {
        let Some(table) = graph.table_of(&entry.table) else {
            continue;
        };
        for column in table.columns() {
            if table.is_primary_key(column) {
                continue;
            }
            let mut detail = column.column_type().to_string();
            if column.nullable() {
                detail.push_str(", may be empty");
            }
            if !column.aliases().is_empty() {
                detail.push_str(&format!("; also called: {}", column.aliases().join(", ")));
            }
            lines.push(format!(
                "- {} ({detail})",
                table.name().column_key(column.name())
            ));
        }
    }
    lines.join("\n")
}

pub(crate) fn build_prompt(
    graph: &RelationshipGraph,
    current: &RelatedRowSet,
    message: &str,
) -> String {
    let record = serde_json::to_string_pretty(&current.to_json()).unwrap_or_default();
    let message = truncate_for_prompt(message, MAX_MESSAGE_CHARS);
    format!(
        "You keep database records up to date from what users tell you.\n\n\
The current database records are (grouped by table, keys are schema.table.column):\n\
{record}\n\n\
Columns that may be changed:\n\
{columns}\n\n\
The user provided the following input: \"{message}\"\n\n\
Reply with JSON only, no prose, in exactly one of these shapes:\n\
- {{\"changes\": [{{\"field\": \"schema.table.column\", \"value\": <new value>}}]}} \
when the user provides or corrects information;\n\
- {{\"query\": {{\"fields\": [\"schema.table.column\"]}}}} when the user only asks \
about current values.\n\
Use only the column keys listed above. Include only values the user actually stated. \
Dates are YYYY-MM-DD, times HH:MM:SS, use null to clear a value that may be empty.\n",
        columns = render_columns(graph, current),
    )
}
