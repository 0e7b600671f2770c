use crate::error::Result;
use crate::schema::line_items::*;
use crate::schema::{ExtractionMetadata, LineItems, ValueStatus};
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const INCOME_STATEMENT_SHEET: &str = "Income Statement";
pub const METADATA_SHEET: &str = "Metadata";

pub const STATUS_EXTRACTED: &str = "✓ Extracted";
pub const STATUS_CALCULATED: &str = "⚡ Calculated";
pub const STATUS_PARTIAL: &str = "⚠ Partial";
pub const STATUS_NOT_FOUND: &str = "✗ Not found";
pub const NOT_DISCLOSED: &str = "Not disclosed";

/// Row layout of the income statement sheet. Empty strings are spacer rows;
/// entries ending in ':' are section headings.
const DISPLAY_ORDER: [&str; 17] = [
    REVENUE_FROM_OPERATIONS,
    OTHER_INCOME,
    TOTAL_REVENUE,
    "",
    "Expenses:",
    COST_OF_MATERIALS,
    EMPLOYEE_BENEFITS,
    OTHER_EXPENSES,
    "",
    GROSS_PROFIT,
    GROSS_MARGIN,
    EBITDA,
    FINANCE_COSTS,
    DEPRECIATION,
    PROFIT_BEFORE_TAX,
    TAX_EXPENSE,
    PROFIT_AFTER_TAX,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Lays out an extracted statement as spreadsheet rows, periods in metadata order.
pub fn build_statement_sheets(line_items: &LineItems, metadata: &ExtractionMetadata) -> Vec<Sheet> {
    let periods = &metadata.periods;
    let width = periods.len() + 3;

    let mut rows = Vec::with_capacity(DISPLAY_ORDER.len() + 1);
    let mut header = vec!["Particulars".to_string()];
    header.extend(periods.iter().cloned());
    header.push("Status".to_string());
    header.push("Notes".to_string());
    rows.push(header);

    for name in DISPLAY_ORDER {
        if name.is_empty() {
            rows.push(vec![String::new(); width]);
            continue;
        }
        if name.ends_with(':') {
            let mut row = vec![name.to_string()];
            row.resize(width, String::new());
            rows.push(row);
            continue;
        }

        let mut row = vec![name.to_string()];
        let Some(item) = line_items.get(name) else {
            row.extend(std::iter::repeat(String::new()).take(periods.len()));
            row.push(STATUS_NOT_FOUND.to_string());
            row.push(NOT_DISCLOSED.to_string());
            rows.push(row);
            continue;
        };

        let mut statuses = Vec::with_capacity(periods.len());
        for period in periods {
            match item.value(period) {
                Some(value) if name == GROSS_MARGIN => row.push(format!("{:.4}", value)),
                Some(value) => row.push(format_amount(value)),
                None => row.push(String::new()),
            }
            statuses.push(item.value(period).and(item.status(period)));
        }

        row.push(overall_status(&statuses).to_string());
        row.push(item.note.clone().unwrap_or_default());
        rows.push(row);
    }

    let metadata_rows = vec![
        vec!["Field".to_string(), "Value".to_string()],
        vec!["Source Document".to_string(), metadata.source_document.clone()],
        vec!["Extracted At".to_string(), metadata.extracted_at.to_rfc3339()],
        vec!["Currency".to_string(), metadata.currency.as_str().to_string()],
        vec!["Unit".to_string(), metadata.unit.as_str().to_string()],
        vec!["Periods".to_string(), periods.join(", ")],
    ];

    vec![
        Sheet {
            name: INCOME_STATEMENT_SHEET.to_string(),
            rows,
        },
        Sheet {
            name: METADATA_SHEET.to_string(),
            rows: metadata_rows,
        },
    ]
}

fn overall_status(statuses: &[Option<ValueStatus>]) -> &'static str {
    if statuses.iter().all(|s| *s == Some(ValueStatus::Extracted)) {
        STATUS_EXTRACTED
    } else if statuses.iter().all(|s| *s == Some(ValueStatus::Calculated)) {
        STATUS_CALCULATED
    } else {
        STATUS_PARTIAL
    }
}

/// Two decimals with comma thousands separators, e.g. `-1,234,567.89`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Currency, LineItem, Unit};
    use chrono::{TimeZone, Utc};

    fn metadata() -> ExtractionMetadata {
        ExtractionMetadata {
            source_document: "results.pdf".into(),
            extracted_at: Utc.with_ymd_and_hms(2025, 5, 20, 10, 0, 0).unwrap(),
            currency: Currency::Inr,
            unit: Unit::Crores,
            periods: vec!["FY25".into(), "FY24".into()],
        }
    }

    fn sample_items() -> LineItems {
        let rows = vec![
            LineItem::new(REVENUE_FROM_OPERATIONS)
                .with_value("FY25", 204813.5, ValueStatus::Extracted)
                .with_value("FY24", 180000.0, ValueStatus::Extracted),
            LineItem::new(GROSS_MARGIN)
                .with_value("FY25", 0.41234567, ValueStatus::Calculated)
                .with_value("FY24", 0.4, ValueStatus::Calculated),
            LineItem::new(TOTAL_REVENUE)
                .with_value("FY25", 210000.0, ValueStatus::Calculated)
                .with_value("FY24", 185000.0, ValueStatus::Extracted),
            LineItem::new(OTHER_INCOME).with_value("FY25", 12.0, ValueStatus::Extracted),
        ];
        rows.into_iter().map(|i| (i.name.clone(), i)).collect()
    }

    fn find<'a>(sheet: &'a Sheet, label: &str) -> &'a Vec<String> {
        sheet.rows.iter().find(|r| r[0] == label).unwrap()
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-45000.5), "-45,000.50");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    #[test]
    fn test_income_statement_layout() {
        let sheets = build_statement_sheets(&sample_items(), &metadata());
        let sheet = &sheets[0];
        assert_eq!(sheet.name, INCOME_STATEMENT_SHEET);
        assert_eq!(sheet.rows.len(), 18);
        assert_eq!(sheet.rows[0], vec!["Particulars", "FY25", "FY24", "Status", "Notes"]);
        assert_eq!(sheet.rows[4], vec![""; 5]);
        assert_eq!(sheet.rows[5], vec!["Expenses:", "", "", "", ""]);

        let revenue = find(sheet, REVENUE_FROM_OPERATIONS);
        assert_eq!(revenue[1], "204,813.50");
        assert_eq!(revenue[3], STATUS_EXTRACTED);

        let margin = find(sheet, GROSS_MARGIN);
        assert_eq!(margin[1], "0.4123");
        assert_eq!(margin[3], STATUS_CALCULATED);

        assert_eq!(find(sheet, TOTAL_REVENUE)[3], STATUS_PARTIAL);
        assert_eq!(find(sheet, OTHER_INCOME)[2], "");
        assert_eq!(find(sheet, OTHER_INCOME)[3], STATUS_PARTIAL);

        let missing = find(sheet, PROFIT_AFTER_TAX);
        assert_eq!(missing, &vec![PROFIT_AFTER_TAX, "", "", STATUS_NOT_FOUND, NOT_DISCLOSED]);
    }

    #[test]
    fn test_metadata_sheet() {
        let sheets = build_statement_sheets(&LineItems::new(), &metadata());
        let meta = &sheets[1];
        assert_eq!(meta.name, METADATA_SHEET);
        assert_eq!(find(meta, "Currency")[1], "INR");
        assert_eq!(find(meta, "Unit")[1], "crores");
        assert_eq!(find(meta, "Periods")[1], "FY25, FY24");
        assert!(find(meta, "Extracted At")[1].starts_with("2025-05-20T10:00:00"));
    }

    #[test]
    fn test_csv_output() {
        let sheets = build_statement_sheets(&sample_items(), &metadata());
        let csv = sheets[0].to_csv_string().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Particulars,FY25,FY24,Status,Notes"));
        assert!(csv.contains("Revenue from operations,\"204,813.50\",\"180,000.00\",✓ Extracted,"));
    }
}
