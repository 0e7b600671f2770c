//! # Earnings Insight
//!
//! Turns the text of earnings-call transcripts and financial statements into
//! structured, validated data with the help of a chat-completion model.
//!
//! ## Core Concepts
//!
//! - **Chunking**: long documents are split on sentence boundaries into overlapping segments
//! - **Analysis**: each segment is queried for management tone, confidence, positives,
//!   concerns, forward guidance, capacity trends and growth initiatives
//! - **Merging**: per-segment answers are combined by majority vote, bounded unions
//!   and conflict-preserving joins
//! - **Validation**: merged output is sanitized and checked before it becomes an [`AnalysisResult`]
//! - **Extraction**: income statement line items are pulled out per fiscal period and
//!   Total Revenue, Gross Profit, Gross Margin and EBITDA are derived from them
//!
//! The model sits behind the [`CompletionService`] trait. Enable the
//! `github-models` feature for an HTTP client against an OpenAI-compatible
//! chat completions endpoint.
//!
//! ## Example
//!
//! ```rust,ignore
//! use earnings_insight::*;
//!
//! let config = PortalConfig::from_env()?;
//! let client = ChatCompletionsClient::from_config(&config)?;
//! let portal = ResearchPortal::new(client, config);
//!
//! let receipt = portal.upload(transcript_text, Some("q4_call.txt"))?;
//! let response = portal.analyze(&receipt.document_id).await?;
//! println!("{}", serde_json::to_string_pretty(&response.analysis)?);
//! ```

pub mod chunking;
pub mod config;
pub mod derived;
pub mod diagnostics;
pub mod error;
pub mod llm;
pub mod merge;
pub mod periods;
pub mod portal;
pub mod report;
pub mod schema;
pub mod store;
pub mod validator;

pub use chunking::{chunk_text, chunk_text_with_defaults, estimate_tokens, needs_chunking};
pub use config::{ChunkingConfig, PortalConfig, SamplingConfig};
pub use derived::calculate_derived_metrics;
pub use diagnostics::TextDiagnostics;
pub use error::{ErrorKind, ErrorReport, ResearchError, Result};
#[cfg(feature = "github-models")]
pub use llm::ChatCompletionsClient;
pub use llm::{
    parse_json_object, strip_code_fences, CompletionRequest, CompletionService, EarningsAnalyzer,
    FinancialExtractor,
};
pub use merge::{merge_line_items, merge_results};
pub use periods::{extract_currency_and_unit, extract_periods_from_text};
pub use portal::{AnalysisResponse, AnalyzeRequest, HealthStatus, ResearchPortal, UploadRequest};
pub use report::{build_statement_sheets, Sheet};
pub use schema::*;
pub use store::{Document, DocumentReceipt, DocumentStore};
pub use validator::{sanitize_output, validate_analysis_output, ValidationOutcome};

/// Analyzes a transcript with default chunking and sampling settings.
pub async fn analyze_transcript<S: CompletionService>(service: S, text: &str) -> Result<AnalysisResult> {
    EarningsAnalyzer::new(service).analyze_document(text).await
}

/// Extracts an income statement with default chunking and sampling settings.
pub async fn extract_financial_statement<S: CompletionService>(
    service: S,
    text: &str,
    source_name: &str,
) -> Result<FinancialStatement> {
    FinancialExtractor::new(service).extract(text, source_name).await
}
