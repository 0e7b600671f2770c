use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest slice of a raw LLM response kept inside an error message.
pub const RESPONSE_EXCERPT_CHARS: usize = 500;

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("Empty text received. Please ensure the document has content.")]
    EmptyText,

    #[error("Text too large: {length} characters (maximum {max_length})")]
    TextTooLarge { length: usize, max_length: usize },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Document not found: {0}. Please upload first.")]
    DocumentNotFound(String),

    #[error("No fiscal periods (e.g. FY25) detected in document")]
    NoPeriodsDetected,

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("Failed to parse model response: {reason}\nResponse: {excerpt}")]
    MalformedResponse { reason: String, excerpt: String },

    #[error("Expected a JSON object, got {0}")]
    NotAnObject(String),

    #[error("Analysis output validation failed: {0}")]
    SchemaViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document store lock poisoned")]
    StorePoisoned,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "github-models")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied something unusable; retrying with different input may help.
    Input,
    /// The LLM call failed or returned text that is not a JSON object.
    ExternalService,
    /// The model's JSON could not be brought into the output contract.
    Schema,
    Internal,
}

/// Structured error description handed back to callers instead of a crash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl ResearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyText
            | Self::TextTooLarge { .. }
            | Self::MissingField(_)
            | Self::DocumentNotFound(_)
            | Self::NoPeriodsDetected => ErrorKind::Input,
            Self::Completion(_) | Self::MalformedResponse { .. } => ErrorKind::ExternalService,
            #[cfg(feature = "github-models")]
            Self::HttpError(_) => ErrorKind::ExternalService,
            Self::NotAnObject(_) | Self::SchemaViolation(_) => ErrorKind::Schema,
            Self::Config(_)
            | Self::StorePoisoned
            | Self::SerializationError(_)
            | Self::CsvError(_)
            | Self::IoError(_) => ErrorKind::Internal,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    /// Wraps a response that could not be used, keeping only its head.
    pub fn malformed(reason: impl Into<String>, raw_response: &str) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
            excerpt: truncate_chars(raw_response, RESPONSE_EXCERPT_CHARS),
        }
    }
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ResearchError::EmptyText.kind(), ErrorKind::Input);
        assert_eq!(ResearchError::NoPeriodsDetected.kind(), ErrorKind::Input);
        assert_eq!(
            ResearchError::Completion("timeout".into()).kind(),
            ErrorKind::ExternalService
        );
        assert_eq!(
            ResearchError::NotAnObject("array".into()).kind(),
            ErrorKind::Schema
        );
    }

    #[test]
    fn test_malformed_response_is_truncated() {
        let raw = "x".repeat(2_000);
        let err = ResearchError::malformed("expected value", &raw);
        match err {
            ResearchError::MalformedResponse { excerpt, .. } => {
                assert_eq!(excerpt.chars().count(), RESPONSE_EXCERPT_CHARS + 3);
                assert!(excerpt.ends_with("..."));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("₹₹₹₹", 2), "₹₹...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_report_serializes_kind() {
        let report = ResearchError::DocumentNotFound("abc".into()).report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "input");
        assert!(json["message"].as_str().unwrap().contains("abc"));
    }
}
