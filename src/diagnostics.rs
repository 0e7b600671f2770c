use crate::chunking::{chunk_text, estimate_tokens, needs_chunking};
use crate::config::ChunkingConfig;
use crate::periods::{extract_currency_and_unit, extract_periods_from_text};
use crate::schema::{Currency, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;

const SAMPLE_CHARS: usize = 100;

/// What the pipeline would see for a piece of text, without calling a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDiagnostics {
    pub char_count: usize,
    pub estimated_tokens: usize,
    pub needs_chunking: bool,
    pub chunk_count: usize,
    pub periods: Vec<String>,
    pub currency: Currency,
    pub unit: Unit,
    pub sample: String,
}

impl TextDiagnostics {
    pub fn inspect(text: &str, chunking: &ChunkingConfig) -> Self {
        let chunked = needs_chunking(text, chunking.threshold_tokens);
        let chunk_count = if chunked {
            chunk_text(text, chunking.max_tokens, chunking.overlap_tokens).len()
        } else {
            1
        };
        let (currency, unit) = extract_currency_and_unit(text);

        Self {
            char_count: text.chars().count(),
            estimated_tokens: estimate_tokens(text),
            needs_chunking: chunked,
            chunk_count,
            periods: extract_periods_from_text(text),
            currency,
            unit,
            sample: text.chars().take(SAMPLE_CHARS).collect(),
        }
    }
}

impl fmt::Display for TextDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Characters:       {}", self.char_count)?;
        writeln!(f, "Estimated tokens: {}", self.estimated_tokens)?;
        writeln!(
            f,
            "Chunking:         {}",
            if self.needs_chunking {
                format!("yes ({} chunks)", self.chunk_count)
            } else {
                "no".to_string()
            }
        )?;
        let periods = if self.periods.is_empty() {
            "none detected".to_string()
        } else {
            self.periods.join(", ")
        };
        writeln!(f, "Periods:          {}", periods)?;
        writeln!(f, "Currency:         {}", self.currency.as_str())?;
        let unit = match self.unit {
            Unit::Unspecified => "not stated",
            unit => unit.as_str(),
        };
        writeln!(f, "Unit:             {}", unit)?;
        write!(f, "Sample:           {}", self.sample.replace('\n', " "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_statement() {
        let text = "Standalone results (Rs. in crore) for FY25 and FY24.";
        let report = TextDiagnostics::inspect(text, &ChunkingConfig::default());

        assert_eq!(report.char_count, text.len());
        assert_eq!(report.estimated_tokens, text.len() / 4);
        assert!(!report.needs_chunking);
        assert_eq!(report.chunk_count, 1);
        assert_eq!(report.periods, vec!["FY25", "FY24"]);
        assert_eq!(report.currency, Currency::Inr);
        assert_eq!(report.unit, Unit::Crores);
    }

    #[test]
    fn test_long_text_reports_chunks() {
        let text = "Revenue grew in every segment. ".repeat(40);
        let chunking = ChunkingConfig {
            threshold_tokens: 100,
            max_tokens: 100,
            overlap_tokens: 10,
        };
        let report = TextDiagnostics::inspect(&text, &chunking);

        assert!(report.needs_chunking);
        assert!(report.chunk_count > 1);
        assert!(report.periods.is_empty());
        assert_eq!(report.sample.chars().count(), 100);

        let rendered = report.to_string();
        assert!(rendered.contains("none detected"));
        assert!(rendered.contains("not stated"));
    }
}
