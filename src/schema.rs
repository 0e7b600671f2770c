use crate::error::{ResearchError, Result};
use crate::validator::validate_analysis_output;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Canonical marker for "the document gave no basis for this value".
pub const NOT_MENTIONED: &str = "Not mentioned";

pub const MANAGEMENT_TONE: &str = "management_tone";
pub const CONFIDENCE_LEVEL: &str = "confidence_level";
pub const KEY_POSITIVES: &str = "key_positives";
pub const KEY_CONCERNS: &str = "key_concerns";
pub const FORWARD_GUIDANCE: &str = "forward_guidance";
pub const CAPACITY_UTILIZATION_TRENDS: &str = "capacity_utilization_trends";
pub const GROWTH_INITIATIVES: &str = "growth_initiatives";

pub const REQUIRED_FIELDS: [&str; 7] = [
    MANAGEMENT_TONE,
    CONFIDENCE_LEVEL,
    KEY_POSITIVES,
    KEY_CONCERNS,
    FORWARD_GUIDANCE,
    CAPACITY_UTILIZATION_TRENDS,
    GROWTH_INITIATIVES,
];

pub const LIST_FIELDS: [&str; 3] = [KEY_POSITIVES, KEY_CONCERNS, GROWTH_INITIATIVES];

pub const GUIDANCE_KEYS: [&str; 3] = ["revenue", "margin", "capex"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ManagementTone {
    #[schemars(description = "Management expects improvement and speaks with conviction")]
    Optimistic,
    #[schemars(description = "Management hedges or highlights risks alongside progress")]
    Cautious,
    #[default]
    Neutral,
    #[schemars(description = "Management expects deterioration")]
    Pessimistic,
}

impl ManagementTone {
    pub const ALL: [ManagementTone; 4] = [
        Self::Optimistic,
        Self::Cautious,
        Self::Neutral,
        Self::Pessimistic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::Cautious => "cautious",
            Self::Neutral => "neutral",
            Self::Pessimistic => "pessimistic",
        }
    }

    /// Case-insensitive lookup.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub const ALL: [ConfidenceLevel; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForwardGuidance {
    #[schemars(description = "Revenue guidance as stated, or 'Not mentioned'")]
    pub revenue: String,
    #[schemars(description = "Margin guidance as stated, or 'Not mentioned'")]
    pub margin: String,
    #[schemars(description = "Capital expenditure guidance as stated, or 'Not mentioned'")]
    pub capex: String,
}

impl Default for ForwardGuidance {
    fn default() -> Self {
        Self {
            revenue: NOT_MENTIONED.to_string(),
            margin: NOT_MENTIONED.to_string(),
            capex: NOT_MENTIONED.to_string(),
        }
    }
}

/// Sentiment and commentary extracted from an earnings call or management discussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    pub management_tone: ManagementTone,
    pub confidence_level: ConfidenceLevel,
    #[schemars(description = "Positive developments explicitly stated in the document (at most 10)")]
    pub key_positives: Vec<String>,
    #[schemars(description = "Concerns or risks explicitly stated in the document (at most 10)")]
    pub key_concerns: Vec<String>,
    pub forward_guidance: ForwardGuidance,
    #[schemars(description = "Capacity utilization commentary, or 'Not mentioned'")]
    pub capacity_utilization_trends: String,
    #[schemars(description = "Growth initiatives explicitly stated in the document (at most 10)")]
    pub growth_initiatives: Vec<String>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            management_tone: ManagementTone::default(),
            confidence_level: ConfidenceLevel::default(),
            key_positives: Vec::new(),
            key_concerns: Vec::new(),
            forward_guidance: ForwardGuidance::default(),
            capacity_utilization_trends: NOT_MENTIONED.to_string(),
            growth_initiatives: Vec::new(),
        }
    }
}

impl AnalysisResult {
    /// Builds the typed record from sanitized JSON, failing with the validator's
    /// message when the JSON does not satisfy the output contract.
    pub fn from_value(value: &Value) -> Result<Self> {
        let outcome = validate_analysis_output(value);
        if !outcome.ok {
            return Err(ResearchError::SchemaViolation(outcome.message));
        }

        let text = |key: &str| value[key].as_str().unwrap_or(NOT_MENTIONED).to_string();
        let guidance = |key: &str| {
            value[FORWARD_GUIDANCE][key]
                .as_str()
                .unwrap_or(NOT_MENTIONED)
                .to_string()
        };

        Ok(Self {
            management_tone: value[MANAGEMENT_TONE]
                .as_str()
                .and_then(ManagementTone::parse)
                .unwrap_or_default(),
            confidence_level: value[CONFIDENCE_LEVEL]
                .as_str()
                .and_then(ConfidenceLevel::parse)
                .unwrap_or_default(),
            key_positives: string_list(&value[KEY_POSITIVES]),
            key_concerns: string_list(&value[KEY_CONCERNS]),
            forward_guidance: ForwardGuidance {
                revenue: guidance("revenue"),
                margin: guidance("margin"),
                capex: guidance("capex"),
            },
            capacity_utilization_trends: text(CAPACITY_UTILIZATION_TRENDS),
            growth_initiatives: string_list(&value[GROWTH_INITIATIVES]),
        })
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisResult)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

// A lone sentinel entry means the list is empty.
fn string_list(value: &Value) -> Vec<String> {
    let items: Vec<String> = value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    if items.len() == 1 && items[0] == NOT_MENTIONED {
        Vec::new()
    } else {
        items
    }
}

/// Income statement line items the extraction prompt asks for.
pub mod line_items {
    pub const REVENUE_FROM_OPERATIONS: &str = "Revenue from operations";
    pub const OTHER_INCOME: &str = "Other income";
    pub const TOTAL_REVENUE: &str = "Total Revenue";
    pub const COST_OF_MATERIALS: &str = "Cost of materials consumed";
    pub const EMPLOYEE_BENEFITS: &str = "Employee benefits expense";
    pub const OTHER_EXPENSES: &str = "Other expenses";
    pub const FINANCE_COSTS: &str = "Finance costs";
    pub const DEPRECIATION: &str = "Depreciation";
    pub const PROFIT_BEFORE_TAX: &str = "Profit before tax";
    pub const TAX_EXPENSE: &str = "Tax expense";
    pub const PROFIT_AFTER_TAX: &str = "Profit after tax";
    pub const GROSS_PROFIT: &str = "Gross Profit";
    pub const GROSS_MARGIN: &str = "Gross Margin";
    pub const EBITDA: &str = "EBITDA";

    pub const CATALOGUE: [&str; 10] = [
        REVENUE_FROM_OPERATIONS,
        OTHER_INCOME,
        COST_OF_MATERIALS,
        EMPLOYEE_BENEFITS,
        OTHER_EXPENSES,
        FINANCE_COSTS,
        DEPRECIATION,
        PROFIT_BEFORE_TAX,
        TAX_EXPENSE,
        PROFIT_AFTER_TAX,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValueStatus {
    #[schemars(description = "Read directly from the source document by the model")]
    Extracted,
    #[schemars(description = "Derived from other line items")]
    Calculated,
}

/// One income statement row: a value per fiscal period plus where each value came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LineItem {
    pub name: String,
    values: BTreeMap<String, f64>,
    status: BTreeMap<String, ValueStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LineItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
            status: BTreeMap::new(),
            note: None,
        }
    }

    /// Records a value; the status entry is always written alongside it.
    pub fn insert(&mut self, period: impl Into<String>, value: f64, status: ValueStatus) {
        let period = period.into();
        self.status.insert(period.clone(), status);
        self.values.insert(period, value);
    }

    pub fn with_value(mut self, period: impl Into<String>, value: f64, status: ValueStatus) -> Self {
        self.insert(period, value, status);
        self
    }

    pub fn value(&self, period: &str) -> Option<f64> {
        self.values.get(period).copied()
    }

    pub fn status(&self, period: &str) -> Option<ValueStatus> {
        self.status.get(period).copied()
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn periods(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub type LineItems = BTreeMap<String, LineItem>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum Currency {
    #[default]
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum Unit {
    #[serde(rename = "crores")]
    Crores,
    #[serde(rename = "millions")]
    Millions,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crores => "crores",
            Self::Millions => "millions",
            Self::Unspecified => "",
        }
    }

    pub fn parse(value: &str) -> Self {
        let lower = value.trim().to_lowercase();
        if lower.starts_with("crore") {
            Self::Crores
        } else if lower.starts_with("million") {
            Self::Millions
        } else {
            Self::Unspecified
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionMetadata {
    pub source_document: String,
    pub extracted_at: DateTime<Utc>,
    pub currency: Currency,
    pub unit: Unit,
    #[schemars(description = "Fiscal periods, most recent first (e.g. FY25, FY24)")]
    pub periods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialStatement {
    pub metadata: ExtractionMetadata,
    pub line_items: LineItems,
}

impl FinancialStatement {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FinancialStatement)
    }
}
