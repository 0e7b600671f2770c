use crate::config::PortalConfig;
use crate::error::{ResearchError, Result};
use crate::llm::{CompletionService, EarningsAnalyzer, FinancialExtractor};
use crate::schema::{AnalysisResult, FinancialStatement};
use crate::store::{DocumentReceipt, DocumentStore};
use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "research-portal";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadRequest {
    pub text: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub document_id: String,
    pub filename: String,
    pub analysis: AnalysisResult,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

/// Upload-then-analyze workflow over a completion service.
///
/// Uploaded text stays in the store until an analysis or extraction of it
/// succeeds; a failed run leaves it in place so the caller can retry.
pub struct ResearchPortal<S> {
    service: S,
    store: DocumentStore,
    config: PortalConfig,
}

impl<S: CompletionService> ResearchPortal<S> {
    pub fn new(service: S, config: PortalConfig) -> Self {
        Self {
            service,
            store: DocumentStore::new(config.max_text_length()),
            config,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn upload(&self, text: impl Into<String>, filename: Option<&str>) -> Result<DocumentReceipt> {
        let receipt = self.store.create(text, filename)?;
        info!(
            "Received {} ({} characters) as {}",
            receipt.filename, receipt.text_length, receipt.document_id
        );
        Ok(receipt)
    }

    pub fn upload_request(&self, request: UploadRequest) -> Result<DocumentReceipt> {
        let text = request
            .text
            .ok_or_else(|| ResearchError::MissingField("text".to_string()))?;
        self.upload(text, request.filename.as_deref())
    }

    pub async fn analyze(&self, document_id: &str) -> Result<AnalysisResponse> {
        let document = self.store.get(document_id)?;

        let analyzer = EarningsAnalyzer::new(&self.service)
            .with_chunking(self.config.chunking.clone())
            .with_sampling(self.config.sampling.clone());

        let analysis = analyzer.analyze_document(&document.text).await.map_err(|e| {
            warn!("Analysis of {} failed: {}", document_id, e);
            e
        })?;

        self.store.remove(document_id)?;
        info!("Analysis of {} completed", document_id);

        Ok(AnalysisResponse {
            document_id: document_id.to_string(),
            filename: document.filename,
            analysis,
            status: "completed".to_string(),
        })
    }

    pub async fn analyze_request(&self, request: AnalyzeRequest) -> Result<AnalysisResponse> {
        let document_id = request
            .document_id
            .ok_or_else(|| ResearchError::MissingField("document_id".to_string()))?;
        self.analyze(&document_id).await
    }

    pub async fn extract_financials(&self, document_id: &str) -> Result<FinancialStatement> {
        let document = self.store.get(document_id)?;

        let extractor = FinancialExtractor::new(&self.service)
            .with_chunking(self.config.chunking.clone())
            .with_sampling(self.config.sampling.clone());

        let statement = extractor
            .extract(&document.text, &document.filename)
            .await
            .map_err(|e| {
                warn!("Financial extraction of {} failed: {}", document_id, e);
                e
            })?;

        self.store.remove(document_id)?;
        Ok(statement)
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
        }
    }
}
