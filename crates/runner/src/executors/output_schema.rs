#![forbid(unsafe_code)]

use serde_json::{Value, json};

/// Structured-output contract handed to headless executors. Every property
/// is required, so the two reply kinds share one flat object; see
/// [`reply_from_structured`].
pub(crate) fn interpretation_schema_value() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "kind": { "type": "string", "enum": ["changes", "query"] },
            "changes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "field": { "type": "string" },
                        "value": {
                            "type": ["string", "number", "boolean", "null", "object", "array"]
                        }
                    },
                    "required": ["field", "value"]
                }
            },
            "fields": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["changes", "fields", "kind"]
    })
}

pub(crate) fn interpretation_schema_json_arg() -> Result<String, String> {
    serde_json::to_string(&interpretation_schema_value())
        .map_err(|e| format!("serialize output schema failed: {e}"))
}

/// Folds a flat structured reply into the `{"changes": ...}` or
/// `{"query": ...}` shape the interpretation parser accepts.
pub(crate) fn reply_from_structured(value: Value) -> Result<Value, String> {
    let Value::Object(mut object) = value else {
        return Err("structured output is not an object".to_string());
    };
    let kind = object
        .get("kind")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| "structured output has no kind".to_string())?;
    match kind.as_str() {
        "changes" => {
            let changes = object
                .remove("changes")
                .ok_or_else(|| "structured output has no changes".to_string())?;
            Ok(json!({ "changes": changes }))
        }
        "query" => {
            let fields = object
                .remove("fields")
                .ok_or_else(|| "structured output has no fields".to_string())?;
            Ok(json!({ "query": { "fields": fields } }))
        }
        other => Err(format!("unknown structured output kind: {other}")),
    }
}
