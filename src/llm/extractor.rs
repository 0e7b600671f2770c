use crate::chunking::{chunk_text, needs_chunking};
use crate::config::{ChunkingConfig, SamplingConfig};
use crate::derived::calculate_derived_metrics;
use crate::error::{ResearchError, Result};
use crate::llm::prompts::{create_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use crate::llm::response::parse_json_object;
use crate::llm::service::{CompletionRequest, CompletionService};
use crate::merge::merge_line_items;
use crate::periods::{extract_currency_and_unit, extract_periods_from_text};
use crate::schema::{ExtractionMetadata, FinancialStatement, LineItem, LineItems, Unit, ValueStatus};
use chrono::Utc;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

// The prompt asks for null wherever a value is missing, so every field is optional.
#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    line_items: Option<Vec<RawLineItem>>,
}

#[derive(Debug, Deserialize)]
struct RawLineItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    values: Option<BTreeMap<String, Value>>,
}

/// Pulls income statement line items out of a financial statement and adds
/// the derived metrics.
pub struct FinancialExtractor<S> {
    service: S,
    chunking: ChunkingConfig,
    sampling: SamplingConfig,
}

impl<S: CompletionService> FinancialExtractor<S> {
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

    pub async fn extract(&self, text: &str, source_name: &str) -> Result<FinancialStatement> {
        if text.trim().is_empty() {
            return Err(ResearchError::EmptyText);
        }

        let periods = extract_periods_from_text(text);
        if periods.is_empty() {
            return Err(ResearchError::NoPeriodsDetected);
        }
        let (currency, mut unit) = extract_currency_and_unit(text);
        debug!(
            "Detected periods {:?}, currency {}, unit '{}'",
            periods,
            currency.as_str(),
            unit.as_str()
        );

        let chunks = if needs_chunking(text, self.chunking.threshold_tokens) {
            chunk_text(text, self.chunking.max_tokens, self.chunking.overlap_tokens)
        } else {
            vec![text.to_string()]
        };

        let mut per_chunk = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            info!("Extracting line items from chunk {}/{}...", i + 1, chunks.len());
            let prompt = create_extraction_prompt(chunk, &periods);
            let raw = self
                .service
                .complete(CompletionRequest {
                    system: EXTRACTION_SYSTEM_PROMPT,
                    user: &prompt,
                    temperature: self.sampling.extraction_temperature,
                    top_p: self.sampling.top_p,
                })
                .await?;

            let response = parse_extraction_response(&raw)?;
            if unit == Unit::Unspecified {
                if let Some(reported) = response.unit.as_deref() {
                    unit = Unit::parse(reported);
                }
            }
            per_chunk.push(line_items_from_response(response));
        }

        let mut line_items = merge_line_items(per_chunk);
        info!("Extracted {} line items", line_items.len());

        let derived = calculate_derived_metrics(&line_items);
        debug!("Derived {} additional line items", derived.len());
        line_items.extend(derived);

        Ok(FinancialStatement {
            metadata: ExtractionMetadata {
                source_document: source_name.to_string(),
                extracted_at: Utc::now(),
                currency,
                unit,
                periods,
            },
            line_items,
        })
    }
}

fn parse_extraction_response(raw: &str) -> Result<ExtractionResponse> {
    let value = parse_json_object(raw)?;
    serde_json::from_value(value)
        .map_err(|e| ResearchError::malformed(format!("unexpected extraction shape: {}", e), raw))
}

fn line_items_from_response(response: ExtractionResponse) -> LineItems {
    let mut items = LineItems::new();

    for raw in response.line_items.unwrap_or_default() {
        let Some(name) = raw.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) else {
            continue;
        };
        let Some(values) = raw.values else {
            debug!("No values reported for {}", name);
            continue;
        };

        let item = items
            .entry(name.clone())
            .or_insert_with(|| LineItem::new(name.clone()));

        for (period, value) in &values {
            let period = normalize_period(period);
            if item.value(&period).is_some() {
                continue;
            }
            match parse_amount(value) {
                Some(amount) => item.insert(period, amount, ValueStatus::Extracted),
                None if value.is_null() => {}
                None => warn!("Ignoring non-numeric value {} for {} {}", value, name, period),
            }
        }
    }

    items.retain(|_, item| !item.is_empty());
    items
}

fn normalize_period(period: &str) -> String {
    period.split_whitespace().collect::<String>().to_uppercase()
}

/// Accepts JSON numbers and numeric strings such as "2,04,813.50" or "(1,200)".
fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            let (negative, body) = match trimmed.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
                Some(inner) => (true, inner),
                None => (false, trimmed),
            };
            let cleaned: String = body.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            let amount: f64 = cleaned.parse().ok()?;
            Some(if negative { -amount } else { amount })
        }
        _ => None,
    }
}
