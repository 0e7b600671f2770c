use earnings_insight::chunking::CHARS_PER_TOKEN;
use earnings_insight::*;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned completions in order and records every prompt it saw.
struct MockService {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<(String, f32)>>,
}

impl MockService {
    fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }
}

impl CompletionService for MockService {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((request.user.to_string(), request.temperature));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ResearchError::Completion("mock exhausted".into()))
    }
}

fn chunk_answer(tone: &str, revenue: &str, positives: &[&str]) -> String {
    json!({
        "management_tone": tone,
        "confidence_level": "medium",
        "key_positives": positives,
        "key_concerns": "Not mentioned",
        "forward_guidance": {"revenue": revenue, "margin": "Not mentioned", "capex": "Not mentioned"},
        "capacity_utilization_trends": "Not mentioned",
        "growth_initiatives": []
    })
    .to_string()
}

fn long_transcript() -> String {
    (1..=60)
        .map(|i| format!("Speaker {} discussed order inflows and plant utilisation in detail. ", i))
        .collect()
}

#[test]
fn test_short_text_is_a_single_identical_chunk() {
    let text = "Revenue grew 20%. Margins were stable. Capex guidance unchanged.";
    assert!(estimate_tokens(text) <= 50);
    assert_eq!(chunk_text(text, 50, 5), vec![text.to_string()]);
}

#[test]
fn test_chunks_are_contiguous_with_bounded_overlap() {
    let text = long_transcript();
    let overlap_tokens = 10;
    let chunks = chunk_text(&text, 200, overlap_tokens);
    assert!(chunks.len() > 1);

    for chunk in &chunks {
        assert!(text.contains(chunk.as_str()), "chunk is not a substring of the input");
    }

    for pair in chunks.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let shared = (1..=prev.len().min(next.len()))
            .rev()
            .find(|&n| next.is_char_boundary(n) && prev.ends_with(&next[..n]))
            .unwrap_or(0);
        assert!(shared > 0, "consecutive chunks share no overlap");
        assert!(shared <= overlap_tokens * CHARS_PER_TOKEN);
    }
}

#[test]
fn test_period_detection() {
    let periods = extract_periods_from_text("FY25 revenue grew vs FY2024");
    assert_eq!(periods, vec!["FY25", "FY24"]);

    let (currency, unit) = extract_currency_and_unit("All figures in USD million");
    assert_eq!(currency, Currency::Usd);
    assert_eq!(unit, Unit::Millions);
}

#[test]
fn test_merge_properties() {
    let merged = merge_results(&[
        serde_json::from_str::<Value>(&chunk_answer("optimistic", "10% growth", &["A"])).unwrap(),
        serde_json::from_str::<Value>(&chunk_answer("optimistic", "Not mentioned", &["B"])).unwrap(),
        serde_json::from_str::<Value>(&chunk_answer("cautious", "10% growth", &["A"])).unwrap(),
    ]);
    assert_eq!(merged["management_tone"], "optimistic");
    assert_eq!(merged["forward_guidance"]["revenue"], "10% growth");
    assert_eq!(merged["key_positives"], json!(["A", "B"]));

    let conflicting = merge_results(&[
        json!({"forward_guidance": {"revenue": "5%"}}),
        json!({"forward_guidance": {"revenue": "8%"}}),
    ]);
    assert_eq!(conflicting["forward_guidance"]["revenue"], "5% | 8%");
}

#[test]
fn test_derived_metrics_properties() {
    let mut items = LineItems::new();
    items.insert(
        line_items::TOTAL_REVENUE.to_string(),
        LineItem::new(line_items::TOTAL_REVENUE)
            .with_value("FY25", 100.0, ValueStatus::Extracted)
            .with_value("FY24", 0.0, ValueStatus::Extracted),
    );
    items.insert(
        line_items::COST_OF_MATERIALS.to_string(),
        LineItem::new(line_items::COST_OF_MATERIALS)
            .with_value("FY25", 60.0, ValueStatus::Extracted)
            .with_value("FY24", 5.0, ValueStatus::Extracted),
    );

    let derived = calculate_derived_metrics(&items);
    let gross_profit = &derived[line_items::GROSS_PROFIT];
    assert_eq!(gross_profit.value("FY25"), Some(40.0));
    assert_eq!(gross_profit.status("FY25"), Some(ValueStatus::Calculated));

    let margin = &derived[line_items::GROSS_MARGIN];
    assert!((margin.value("FY25").unwrap() - 0.4).abs() < 1e-12);
    assert_eq!(margin.value("FY24"), None);
}

#[test]
fn test_sanitize_and_validate_properties() {
    let raw = json!({
        "management_tone": "neutral",
        "confidence_level": "low",
        "key_positives": "Not mentioned",
        "key_concerns": "Debt levels",
        "forward_guidance": "none given",
        "capacity_utilization_trends": 72,
        "growth_initiatives": null
    });

    let once = sanitize_output(raw).unwrap();
    assert_eq!(once["key_positives"], json!([]));
    assert_eq!(once["key_concerns"], json!(["Debt levels"]));
    assert_eq!(once["capacity_utilization_trends"], "Not mentioned");
    assert!(validate_analysis_output(&once).ok);

    let twice = sanitize_output(once.clone()).unwrap();
    assert_eq!(twice, once);

    let mut bullish = once;
    bullish["management_tone"] = json!("bullish");
    let outcome = validate_analysis_output(&bullish);
    assert!(!outcome.ok);
    assert!(outcome.message.contains("management_tone"));
}

#[tokio::test]
async fn test_end_to_end_chunked_analysis() {
    let text = long_transcript();
    let config = PortalConfig {
        chunking: ChunkingConfig {
            threshold_tokens: 300,
            max_tokens: 400,
            overlap_tokens: 20,
        },
        ..PortalConfig::default()
    };

    let expected_chunks = chunk_text(&text, 400, 20).len();
    assert!(expected_chunks >= 2);

    let tones = ["optimistic", "cautious", "optimistic", "neutral", "optimistic"];
    let answers = (0..expected_chunks)
        .map(|i| {
            let revenue = if i == 0 { "12-15% growth" } else { "Not mentioned" };
            chunk_answer(tones[i % tones.len()], revenue, &["Order book at record high"])
        })
        .collect();
    let service = MockService::new(answers);
    let portal = ResearchPortal::new(&service, config);

    let receipt = portal.upload(text.clone(), Some("kaynes_q4.txt")).unwrap();
    assert_eq!(receipt.text_length, text.chars().count());

    let response = portal.analyze(&receipt.document_id).await.unwrap();
    assert_eq!(response.status, "completed");
    assert_eq!(response.filename, "kaynes_q4.txt");
    assert_eq!(response.analysis.management_tone, ManagementTone::Optimistic);
    assert_eq!(response.analysis.forward_guidance.revenue, "12-15% growth");
    assert_eq!(response.analysis.key_positives, vec!["Order book at record high".to_string()]);
    assert!(response.analysis.key_concerns.is_empty());
    assert!(portal.store().is_empty());

    let requests = service.requests.lock().unwrap();
    assert_eq!(requests.len(), expected_chunks);
    assert!(requests.iter().all(|(_, temperature)| (*temperature - 0.3).abs() < f32::EPSILON));
}

#[tokio::test]
async fn test_end_to_end_financial_extraction_to_csv() {
    let statement_text = "Statement of Profit and Loss for the year ended 31 March 2025 (₹ in crore)\n\
        Particulars FY25 FY24\n\
        Revenue from operations 2,722 1,805\n\
        Other income 44 21\n\
        Cost of materials consumed 2,011 1,324\n\
        Employee benefits expense 210 160\n\
        Other expenses 120 95";

    let answer = json!({
        "periods": ["FY25", "FY24"],
        "currency": "INR",
        "unit": "crores",
        "line_items": [
            {"name": "Revenue from operations", "values": {"FY25": 2722, "FY24": 1805}},
            {"name": "Other income", "values": {"FY25": 44, "FY24": 21}},
            {"name": "Cost of materials consumed", "values": {"FY25": 2011, "FY24": 1324}},
            {"name": "Employee benefits expense", "values": {"FY25": 210, "FY24": 160}},
            {"name": "Other expenses", "values": {"FY25": "120", "FY24": "95"}}
        ]
    })
    .to_string();

    let service = MockService::new(vec![answer]);
    let statement = extract_financial_statement(&service, statement_text, "results.pdf")
        .await
        .unwrap();

    assert_eq!(statement.metadata.periods, vec!["FY25", "FY24"]);
    assert_eq!(statement.metadata.unit, Unit::Crores);
    let items = &statement.line_items;
    assert_eq!(items[line_items::TOTAL_REVENUE].value("FY25"), Some(2766.0));
    assert_eq!(items[line_items::GROSS_PROFIT].value("FY25"), Some(755.0));
    assert_eq!(items[line_items::EBITDA].value("FY24"), Some(247.0));
    assert!(items[line_items::EBITDA].note.is_none());

    let prompt = &service.prompts()[0];
    assert!(prompt.contains("PERIODS TO EXTRACT: FY25, FY24"));

    let sheets = build_statement_sheets(&statement.line_items, &statement.metadata);
    let csv = sheets[0].to_csv_string().unwrap();
    assert!(csv.contains("Total Revenue,\"2,766.00\",\"1,826.00\",⚡ Calculated,"));
    assert!(csv.contains("Profit after tax,,,✗ Not found,Not disclosed"));
}

#[tokio::test]
async fn test_failures_are_tagged_and_leave_document_in_place() {
    let service = MockService::new(vec!["The call was upbeat overall.".to_string()]);
    let portal = ResearchPortal::new(&service, PortalConfig::default());
    let receipt = portal.upload("Upbeat call.", None).unwrap();
    assert_eq!(receipt.filename, "document.txt");

    let err = portal.analyze(&receipt.document_id).await.unwrap_err();
    let report = err.report();
    assert_eq!(report.kind, ErrorKind::ExternalService);
    assert!(report.message.contains("The call was upbeat overall."));
    assert_eq!(portal.store().len(), 1);

    let err = portal.analyze("00000000-0000-4000-8000-000000000000").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_schema_export() {
    let schema = serde_json::to_value(AnalysisResult::generate_json_schema()).unwrap();
    let properties = schema["properties"].as_object().unwrap();
    for field in REQUIRED_FIELDS {
        assert!(properties.contains_key(field), "schema is missing {}", field);
    }
}
