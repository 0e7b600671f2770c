use crate::error::{ResearchError, Result};
use serde_json::Value;

const FENCE: &str = "```";

/// Removes a markdown code fence wrapped around a JSON payload.
pub fn strip_code_fences(raw: &str) -> String {
    let response = raw.trim();
    if !response.starts_with(FENCE) {
        return response.to_string();
    }

    let lines: Vec<&str> = response.split('\n').collect();
    let body = if lines.len() > 2 {
        lines[1..lines.len() - 1].join("\n")
    } else {
        response.to_string()
    };

    body.replace("```json", "").replace(FENCE, "").trim().to_string()
}

/// Parses a completion into a JSON object, keeping the raw text in the error.
pub fn parse_json_object(raw: &str) -> Result<Value> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| ResearchError::malformed(format!("invalid JSON: {}", e), raw))?;

    if !value.is_object() {
        return Err(ResearchError::malformed(
            "expected a JSON object at the top level",
            raw,
        ));
    }

    Ok(value)
}
