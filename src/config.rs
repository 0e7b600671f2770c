use crate::chunking::{DEFAULT_CHUNKING_THRESHOLD, DEFAULT_OVERLAP_TOKENS};
use crate::error::{ResearchError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://models.inference.ai.azure.com";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 20;

pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const ENDPOINT_VAR: &str = "LLM_ENDPOINT";
pub const MODEL_VAR: &str = "LLM_MODEL";
pub const MAX_FILE_SIZE_VAR: &str = "MAX_FILE_SIZE_MB";

const BYTES_PER_MB: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Documents estimated above this many tokens are chunked.
    pub threshold_tokens: usize,
    pub max_tokens: usize,
    pub overlap_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        // Leaves headroom for the prompt around an 8k-token context window.
        Self {
            threshold_tokens: DEFAULT_CHUNKING_THRESHOLD,
            max_tokens: DEFAULT_CHUNKING_THRESHOLD,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub analysis_temperature: f32,
    pub extraction_temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            analysis_temperature: 0.3,
            extraction_temperature: 0.1,
            top_p: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    #[serde(skip_serializing)]
    pub api_token: String,
    pub endpoint: String,
    pub model: String,
    pub max_file_size_mb: usize,
    pub chunking: ChunkingConfig,
    pub sampling: SamplingConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            chunking: ChunkingConfig::default(),
            sampling: SamplingConfig::default(),
        }
    }
}

impl PortalConfig {
    /// Reads `GITHUB_TOKEN` (required), `LLM_ENDPOINT`, `LLM_MODEL` and `MAX_FILE_SIZE_MB`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        config.api_token = lookup(TOKEN_VAR)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ResearchError::Config(format!("{} not found in environment variables", TOKEN_VAR))
            })?;

        if let Some(endpoint) = lookup(ENDPOINT_VAR) {
            config.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup(MODEL_VAR) {
            config.model = model.trim().to_string();
        }
        if let Some(size) = lookup(MAX_FILE_SIZE_VAR) {
            let megabytes: usize = size.trim().parse().map_err(|_| {
                ResearchError::Config(format!(
                    "{} must be a whole number of megabytes, got '{}'",
                    MAX_FILE_SIZE_VAR, size
                ))
            })?;
            if megabytes.checked_mul(BYTES_PER_MB).is_none() {
                return Err(ResearchError::Config(format!(
                    "{} is too large: {}",
                    MAX_FILE_SIZE_VAR, megabytes
                )));
            }
            config.max_file_size_mb = megabytes;
        }

        Ok(config)
    }

    /// Upper bound on uploaded text, in characters.
    pub fn max_text_length(&self) -> usize {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }
}
