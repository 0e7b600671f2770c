use crate::schema::{Currency, Unit};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Currency and unit hints are only looked for in the document header.
pub const HEADER_CHARS: usize = 2000;

const INR_MARKERS: [&str; 3] = ["₹", "rs.", "rupees"];
const USD_MARKERS: [&str; 2] = ["$", "usd"];

// Compile-once regex patterns via OnceLock.
fn two_digit_fy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)FY\s*(\d{2,})").unwrap())
}

fn four_digit_fy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)FY\s*(\d{4})").unwrap())
}

fn fiscal_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)fiscal\s+year\s+(\d{4})").unwrap())
}

fn year_ended_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)year\s+ended\s+.*?(\d{4})").unwrap())
}

/// Normalizes a captured year ("25" or "2025") to "FY25".
fn fiscal_label(year: &str) -> String {
    let digits: Vec<char> = year.chars().collect();
    let last_two: String = digits[digits.len().saturating_sub(2)..].iter().collect();
    format!("FY{}", last_two)
}

/// Finds every fiscal year referenced in the text, most recent first.
///
/// "FY25", "FY 2025", "fiscal year 2025" and "year ended March 31, 2025" all
/// normalize to "FY25". An empty result means no period was found.
pub fn extract_periods_from_text(text: &str) -> Vec<String> {
    let mut periods = BTreeSet::new();

    // Longer digit runs belong to the four-digit pattern.
    for caps in two_digit_fy_re().captures_iter(text) {
        if caps[1].len() == 2 {
            periods.insert(fiscal_label(&caps[1]));
        }
    }

    for re in [four_digit_fy_re(), fiscal_year_re(), year_ended_re()] {
        for caps in re.captures_iter(text) {
            periods.insert(fiscal_label(&caps[1]));
        }
    }

    periods.into_iter().rev().collect()
}

/// Detects reporting currency and unit from the document header.
///
/// Defaults to INR; rupee markers take precedence over dollar markers.
pub fn extract_currency_and_unit(text: &str) -> (Currency, Unit) {
    let header: String = text.chars().take(HEADER_CHARS).collect::<String>().to_lowercase();

    let currency = if INR_MARKERS.iter().any(|m| header.contains(m)) {
        Currency::Inr
    } else if USD_MARKERS.iter().any(|m| header.contains(m)) {
        Currency::Usd
    } else {
        Currency::Inr
    };

    let unit = if header.contains("crore") {
        Unit::Crores
    } else if header.contains("million") {
        Unit::Millions
    } else {
        Unit::Unspecified
    };

    (currency, unit)
}
