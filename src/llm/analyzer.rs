use crate::chunking::{chunk_text, needs_chunking};
use crate::config::{ChunkingConfig, SamplingConfig};
use crate::error::{ResearchError, Result};
use crate::llm::prompts::{analysis_prompt, ANALYST_SYSTEM_PROMPT};
use crate::llm::response::parse_json_object;
use crate::llm::service::{CompletionRequest, CompletionService};
use crate::merge::merge_results;
use crate::schema::AnalysisResult;
use crate::validator::sanitize_output;
use log::{debug, info};
use serde_json::Value;

/// Runs the sentiment pipeline: chunk, query each chunk in order, merge,
/// sanitize and validate.
pub struct EarningsAnalyzer<S> {
    service: S,
    chunking: ChunkingConfig,
    sampling: SamplingConfig,
}

impl<S: CompletionService> EarningsAnalyzer<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            chunking: ChunkingConfig::default(),
            sampling: SamplingConfig::default(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    /// The segments that will be sent to the model, in order.
    pub fn split(&self, text: &str) -> Vec<String> {
        if needs_chunking(text, self.chunking.threshold_tokens) {
            chunk_text(text, self.chunking.max_tokens, self.chunking.overlap_tokens)
        } else {
            vec![text.to_string()]
        }
    }

    /// Queries the model once and returns its JSON object unmodified.
    pub async fn analyze_chunk(&self, text: &str) -> Result<Value> {
        let prompt = analysis_prompt(text);
        let raw = self
            .service
            .complete(CompletionRequest {
                system: ANALYST_SYSTEM_PROMPT,
                user: &prompt,
                temperature: self.sampling.analysis_temperature,
                top_p: self.sampling.top_p,
            })
            .await?;

        parse_json_object(&raw)
    }

    pub async fn analyze_document(&self, text: &str) -> Result<AnalysisResult> {
        if text.trim().is_empty() {
            return Err(ResearchError::EmptyText);
        }

        let chunks = self.split(text);
        let mut results = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            info!("Analyzing chunk {}/{}...", i + 1, chunks.len());
            debug!("Chunk {} is {} characters", i + 1, chunk.chars().count());
            results.push(self.analyze_chunk(chunk).await?);
        }

        let merged = merge_results(&results);
        let sanitized = sanitize_output(merged)?;
        AnalysisResult::from_value(&sanitized)
    }
}
