//! Reconciling per-chunk analysis results into one record.
//!
//! Categorical fields are decided by majority vote. Open-ended fields are
//! unioned or concatenated so disagreement between chunks stays visible.

use crate::schema::{
    LineItems, CAPACITY_UTILIZATION_TRENDS, CONFIDENCE_LEVEL, FORWARD_GUIDANCE, GUIDANCE_KEYS,
    LIST_FIELDS, MANAGEMENT_TONE, NOT_MENTIONED,
};
use crate::schema::{ConfidenceLevel, ManagementTone, ValueStatus};
use serde_json::{json, Map, Value};
use std::collections::btree_map::Entry;
use std::collections::BTreeSet;

pub const MAX_MERGED_LIST_ITEMS: usize = 5;
pub const CONFLICT_SEPARATOR: &str = " | ";

/// Merges chunk results in chunk order. A single result is returned as-is.
pub fn merge_results(results: &[Value]) -> Value {
    if let [single] = results {
        return single.clone();
    }

    let mut merged = Map::new();

    merged.insert(
        MANAGEMENT_TONE.to_string(),
        Value::String(majority_vote(
            results,
            MANAGEMENT_TONE,
            ManagementTone::default().as_str(),
        )),
    );
    merged.insert(
        CONFIDENCE_LEVEL.to_string(),
        Value::String(majority_vote(
            results,
            CONFIDENCE_LEVEL,
            ConfidenceLevel::default().as_str(),
        )),
    );

    for key in LIST_FIELDS {
        merged.insert(key.to_string(), json!(union_lists(results, key)));
    }

    let mut guidance = Map::new();
    for key in GUIDANCE_KEYS {
        guidance.insert(key.to_string(), Value::String(merge_guidance(results, key)));
    }
    merged.insert(FORWARD_GUIDANCE.to_string(), Value::Object(guidance));

    merged.insert(
        CAPACITY_UTILIZATION_TRENDS.to_string(),
        Value::String(merge_trends(results)),
    );

    Value::Object(merged)
}

fn mentioned(value: &Value) -> Option<&str> {
    value
        .as_str()
        .filter(|s| !s.is_empty() && *s != NOT_MENTIONED)
}

/// Most frequent mentioned value; on a tie the value seen first wins.
fn majority_vote(results: &[Value], key: &str, fallback: &str) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for value in results.iter().filter_map(|r| r.get(key)).filter_map(mentioned) {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut winner: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if winner.map_or(true, |(_, best)| count > best) {
            winner = Some((value, count));
        }
    }

    winner.map_or_else(|| fallback.to_string(), |(value, _)| value.to_string())
}

fn union_lists(results: &[Value], key: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();

    for entries in results.iter().filter_map(|r| r.get(key)).filter_map(Value::as_array) {
        for item in entries.iter().filter_map(mentioned) {
            if !items.iter().any(|existing| existing == item) {
                items.push(item.to_string());
            }
        }
    }

    items.truncate(MAX_MERGED_LIST_ITEMS);
    items
}

fn merge_guidance(results: &[Value], key: &str) -> String {
    let distinct: BTreeSet<&str> = results
        .iter()
        .filter_map(|r| r.get(FORWARD_GUIDANCE))
        .filter_map(|guidance| guidance.get(key))
        .filter_map(mentioned)
        .collect();

    if distinct.is_empty() {
        NOT_MENTIONED.to_string()
    } else {
        distinct.into_iter().collect::<Vec<_>>().join(CONFLICT_SEPARATOR)
    }
}

fn merge_trends(results: &[Value]) -> String {
    let mut trends: Vec<&str> = Vec::new();
    for trend in results
        .iter()
        .filter_map(|r| r.get(CAPACITY_UTILIZATION_TRENDS))
        .filter_map(mentioned)
    {
        if !trends.contains(&trend) {
            trends.push(trend);
        }
    }

    if trends.is_empty() {
        NOT_MENTIONED.to_string()
    } else {
        trends.join(CONFLICT_SEPARATOR)
    }
}

/// Combines line items extracted from separate chunks.
///
/// The first chunk to report a value for a period keeps it.
pub fn merge_line_items(chunks: Vec<LineItems>) -> LineItems {
    let mut merged = LineItems::new();

    for items in chunks {
        for (name, item) in items {
            match merged.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(item);
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    for (period, value) in item.values() {
                        if existing.value(period).is_none() {
                            let status = item.status(period).unwrap_or(ValueStatus::Extracted);
                            existing.insert(period.clone(), *value, status);
                        }
                    }
                }
            }
        }
    }

    merged
}
