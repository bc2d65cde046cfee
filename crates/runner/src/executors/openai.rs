#![forbid(unsafe_code)]

use serde_json::{Value, json};
use std::time::Duration;

pub(crate) const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const SYSTEM_PROMPT: &str = "You turn user messages into structured updates of database records. \
Answer with a single JSON object and nothing else.";

pub(crate) fn build_payload(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "temperature": 0,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": prompt }
        ]
    })
}

/// First choice's message content.
pub(crate) fn extract_content(response: &Value) -> Result<String, String> {
    response
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| "openai response has no message content".to_string())
}

pub(crate) fn complete(
    api_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, String> {
    let response = ureq::post(api_url)
        .set("Authorization", &format!("Bearer {api_key}"))
        .timeout(REQUEST_TIMEOUT)
        .send_json(build_payload(model, prompt))
        .map_err(|e| format!("openai request failed: {e}"))?;
    let body: Value = response
        .into_json()
        .map_err(|e| format!("read openai response failed: {e}"))?;
    extract_content(&body)
}
