#![forbid(unsafe_code)]

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Stdio};

pub(crate) struct ClaudeRequest<'a> {
    pub(crate) claude_bin: &'a str,
    pub(crate) schema_json: &'a str,
    pub(crate) prompt: &'a str,
    pub(crate) model: Option<&'a str>,
    pub(crate) work_dir: &'a Path,
}

fn command(req: &ClaudeRequest<'_>) -> Command {
    let mut cmd = Command::new(req.claude_bin);
    cmd.arg("-p")
        .arg("--output-format")
        .arg("json")
        .arg("--json-schema")
        .arg(req.schema_json)
        .arg("--no-session-persistence");
    if let Some(model) = req.model {
        cmd.arg("--model").arg(model);
    }
    // `claude` has no `--cwd` flag.
    cmd.current_dir(req.work_dir);
    cmd.arg(req.prompt);
    cmd
}

pub(crate) fn run(req: &ClaudeRequest<'_>) -> Result<Value, String> {
    let output = command(req)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("failed to spawn claude ({}): {e}", req.claude_bin))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "claude exited with {}: {}",
            output.status,
            crate::prompt::truncate_for_prompt(&stderr, 400)
        ));
    }
    let value: Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| format!("parse claude json failed: {e}"))?;
    Ok(unwrap_structured(value))
}

/// `--output-format json` wraps the schema-validated payload in a result
/// object under `structured_output`.
pub(crate) fn unwrap_structured(value: Value) -> Value {
    match value {
        Value::Object(mut object) if object.contains_key("structured_output") => object
            .remove("structured_output")
            .unwrap_or(Value::Null),
        other => other,
    }
}
