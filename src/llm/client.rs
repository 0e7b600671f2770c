use crate::config::PortalConfig;
use crate::error::{ResearchError, Result};
use crate::llm::service::{CompletionRequest, CompletionService};
use crate::llm::types::*;
use log::debug;
use reqwest::Client;

/// OpenAI-compatible chat completions client (GitHub Models by default).
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    api_token: String,
    endpoint: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(api_token: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_token: api_token.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &PortalConfig) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(ResearchError::Config("API token is empty".to_string()));
        }
        Ok(Self::new(&config.api_token, &config.endpoint, &config.model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: CompletionRequest<'_>) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(request.system),
                ChatMessage::user(request.user),
            ],
            temperature: request.temperature,
            top_p: request.top_p,
        };

        debug!("POST {} (model {}, {} prompt chars)", url, self.model, request.user.len());
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(ResearchError::Completion(format!(
                "API error (status {}): {}",
                status, err_text
            )));
        }

        let body: ChatCompletionResponse = res.json().await?;
        body.first_content()
            .ok_or_else(|| ResearchError::malformed("no message content in completion", ""))
    }
}

impl CompletionService for ChatCompletionsClient {
    fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> impl std::future::Future<Output = Result<String>> + Send {
        self.send(request)
    }
}
