// Instruction templates for the two extraction passes.

use crate::schema::line_items::CATALOGUE;

pub const ANALYST_SYSTEM_PROMPT: &str = r#"You are a professional financial research analyst.

CRITICAL RULES:
1. Use ONLY information explicitly stated in the document.
2. Do NOT infer, guess, or use external knowledge.
3. If information is missing or unclear, return the value: "Not mentioned"
4. Do NOT add explanations, notes, or commentary.
5. Output MUST be valid JSON matching the provided schema.
6. Do NOT include markdown code blocks or any text outside the JSON object.

Any violation of these rules is unacceptable."#;

pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a financial data extraction specialist. Output only valid JSON.";

const ANALYSIS_SCHEMA_EXAMPLE: &str = r#"{
  "management_tone": "<optimistic|cautious|neutral|pessimistic>",
  "confidence_level": "<high|medium|low>",
  "key_positives": ["<item1>", "<item2>", ...],
  "key_concerns": ["<item1>", "<item2>", ...],
  "forward_guidance": {
    "revenue": "<value or 'Not mentioned'>",
    "margin": "<value or 'Not mentioned'>",
    "capex": "<value or 'Not mentioned'>"
  },
  "capacity_utilization_trends": "<value or 'Not mentioned'>",
  "growth_initiatives": ["<item1>", "<item2>", ...]
}"#;

const EXTRACTION_SCHEMA_EXAMPLE: &str = r#"{
  "periods": [list of periods found],
  "currency": "INR|USD",
  "unit": "crores|millions",
  "line_items": [
    {
      "name": "Revenue from operations",
      "values": {"FY25": 204813.0, "FY24": 163210.0},
      "confidence": "high"
    }
  ]
}"#;

/// User prompt for sentiment and commentary extraction over one document or chunk.
pub fn analysis_prompt(text: &str) -> String {
    format!(
        "Analyze the following earnings call transcript or management discussion.\n\
         \n\
         Extract the information strictly based on the text.\n\
         \n\
         Return the result in the following JSON schema:\n\
         \n\
         {schema}\n\
         \n\
         Rules:\n\
         - If a value is not mentioned in the text, use \"Not mentioned\"\n\
         - Do NOT make up information\n\
         - Do NOT include any text outside the JSON object\n\
         - Do NOT use markdown code blocks\n\
         \n\
         DOCUMENT TEXT:\n\
         ---\n\
         {text}\n\
         ---",
        schema = ANALYSIS_SCHEMA_EXAMPLE,
        text = text
    )
}

/// User prompt for income statement line-item extraction.
pub fn create_extraction_prompt(text: &str, periods: &[String]) -> String {
    let catalogue = CATALOGUE
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Extract financial statement data from this document.\n\
         \n\
         PERIODS TO EXTRACT: {periods}\n\
         \n\
         RULES:\n\
         1. Extract ONLY values explicitly stated\n\
         2. Do NOT calculate or infer values\n\
         3. Use null for missing items\n\
         4. Preserve exact numbers\n\
         \n\
         OUTPUT JSON:\n\
         {schema}\n\
         \n\
         EXTRACT THESE LINE ITEMS (if present):\n\
         {catalogue}\n\
         \n\
         DOCUMENT:\n\
         {text}\n\
         \n\
         Return ONLY the JSON object.",
        periods = periods.join(", "),
        schema = EXTRACTION_SCHEMA_EXAMPLE,
        catalogue = catalogue,
        text = text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_embeds_document() {
        let prompt = analysis_prompt("Revenue grew 12% in Q3.");
        assert!(prompt.contains("---\nRevenue grew 12% in Q3.\n---"));
        assert!(prompt.contains("\"management_tone\""));
        assert!(prompt.starts_with("Analyze the following earnings call"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let periods = vec!["FY25".to_string(), "FY24".to_string()];
        assert_eq!(
            create_extraction_prompt("doc", &periods),
            create_extraction_prompt("doc", &periods)
        );
        assert_eq!(analysis_prompt("doc"), analysis_prompt("doc"));
    }

    #[test]
    fn test_extraction_prompt_lists_periods_and_catalogue() {
        let periods = vec!["FY25".to_string(), "FY24".to_string()];
        let prompt = create_extraction_prompt("Statement of profit and loss", &periods);

        assert!(prompt.contains("PERIODS TO EXTRACT: FY25, FY24\n"));
        assert!(prompt.contains("- Cost of materials consumed\n"));
        assert!(prompt.contains("- Profit after tax\n"));
        assert!(prompt.contains("DOCUMENT:\nStatement of profit and loss\n"));
        assert!(prompt.ends_with("Return ONLY the JSON object."));
    }
}
