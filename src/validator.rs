//! Output contract enforcement for sentiment analysis results.
//!
//! [`sanitize_output`] coerces shape deviations that have an obvious safe
//! default; [`validate_analysis_output`] then checks the contract strictly and
//! never mutates its input.

use crate::error::{ResearchError, Result};
use crate::schema::{
    ConfidenceLevel, ManagementTone, CAPACITY_UTILIZATION_TRENDS, CONFIDENCE_LEVEL,
    FORWARD_GUIDANCE, GUIDANCE_KEYS, LIST_FIELDS, MANAGEMENT_TONE, NOT_MENTIONED,
    REQUIRED_FIELDS,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MAX_LIST_ITEMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub ok: bool,
    pub message: String,
}

impl ValidationOutcome {
    fn valid() -> Self {
        Self {
            ok: true,
            message: "Valid".to_string(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

pub fn default_guidance() -> Value {
    let mut guidance = Map::new();
    for key in GUIDANCE_KEYS {
        guidance.insert(key.to_string(), Value::String(NOT_MENTIONED.to_string()));
    }
    Value::Object(guidance)
}

/// Coerces a raw model result towards the output contract.
///
/// Only a non-object top level is fatal. Fields that are absent stay absent so
/// validation can report them.
pub fn sanitize_output(result: Value) -> Result<Value> {
    let mut sanitized = match result {
        Value::Object(map) => map,
        other => return Err(ResearchError::NotAnObject(describe(&other))),
    };

    for key in LIST_FIELDS {
        if let Some(field) = sanitized.get_mut(key) {
            let replacement = match field {
                Value::Array(_) => None,
                Value::String(s) if s.eq_ignore_ascii_case(NOT_MENTIONED) => {
                    Some(Value::Array(Vec::new()))
                }
                Value::String(s) => Some(Value::Array(vec![Value::String(s.clone())])),
                _ => Some(Value::Array(Vec::new())),
            };
            if let Some(replacement) = replacement {
                *field = replacement;
            }
        }
    }

    if let Some(guidance) = sanitized.get_mut(FORWARD_GUIDANCE) {
        match guidance {
            Value::Object(keys) => keys.retain(|key, _| GUIDANCE_KEYS.contains(&key.as_str())),
            _ => *guidance = default_guidance(),
        }
    }

    let scalar_defaults = [
        (CAPACITY_UTILIZATION_TRENDS, NOT_MENTIONED),
        (MANAGEMENT_TONE, ManagementTone::default().as_str()),
        (CONFIDENCE_LEVEL, ConfidenceLevel::default().as_str()),
    ];
    for (key, default) in scalar_defaults {
        if let Some(field) = sanitized.get_mut(key) {
            if !field.is_string() {
                *field = Value::String(default.to_string());
            }
        }
    }

    Ok(Value::Object(sanitized))
}

pub fn validate_analysis_output(result: &Value) -> ValidationOutcome {
    let Some(map) = result.as_object() else {
        return ValidationOutcome::invalid(format!(
            "Expected a JSON object, got {}",
            describe(result)
        ));
    };

    for field in REQUIRED_FIELDS {
        if !map.contains_key(field) {
            return ValidationOutcome::invalid(format!("Missing required field: {}", field));
        }
    }

    let tone = &map[MANAGEMENT_TONE];
    if tone.as_str().and_then(ManagementTone::parse).is_none() {
        return ValidationOutcome::invalid(format!(
            "Invalid management_tone: {}",
            display_scalar(tone)
        ));
    }

    let confidence = &map[CONFIDENCE_LEVEL];
    if confidence.as_str().and_then(ConfidenceLevel::parse).is_none() {
        return ValidationOutcome::invalid(format!(
            "Invalid confidence_level: {}",
            display_scalar(confidence)
        ));
    }

    for key in LIST_FIELDS {
        if !is_valid_list(&map[key]) {
            return ValidationOutcome::invalid(format!("Invalid {} format", key));
        }
    }

    if let Some(problem) = guidance_problem(&map[FORWARD_GUIDANCE]) {
        return ValidationOutcome::invalid(problem);
    }

    if !map[CAPACITY_UTILIZATION_TRENDS].is_string() {
        return ValidationOutcome::invalid("capacity_utilization_trends must be a string");
    }

    ValidationOutcome::valid()
}

fn is_valid_list(value: &Value) -> bool {
    let Some(items) = value.as_array() else {
        return false;
    };

    if items.is_empty() {
        return true;
    }
    if items.len() == 1 && items[0].as_str() == Some(NOT_MENTIONED) {
        return true;
    }

    items.len() <= MAX_LIST_ITEMS && items.iter().all(Value::is_string)
}

/// Guidance must hold exactly the revenue, margin and capex strings.
fn guidance_problem(value: &Value) -> Option<String> {
    const STRUCTURE: &str = "Invalid forward_guidance structure";

    let Some(guidance) = value.as_object() else {
        return Some(STRUCTURE.to_string());
    };

    if !GUIDANCE_KEYS
        .iter()
        .all(|key| guidance.get(*key).is_some_and(Value::is_string))
    {
        return Some(STRUCTURE.to_string());
    }

    guidance
        .keys()
        .find(|key| !GUIDANCE_KEYS.contains(&key.as_str()))
        .map(|key| format!("{}: unexpected key '{}'", STRUCTURE, key))
}

fn describe(value: &Value) -> String {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("{}: {}", kind, crate::error::truncate_chars(&value.to_string(), 200))
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
