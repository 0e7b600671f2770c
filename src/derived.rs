use crate::schema::line_items::{
    COST_OF_MATERIALS, EBITDA, EMPLOYEE_BENEFITS, GROSS_MARGIN, GROSS_PROFIT, OTHER_EXPENSES,
    OTHER_INCOME, REVENUE_FROM_OPERATIONS, TOTAL_REVENUE,
};
use crate::schema::{LineItem, LineItems, ValueStatus};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Computes Total Revenue, Gross Profit, Gross Margin and EBITDA from extracted line items.
///
/// Only newly computed items are returned; callers merge them into the full set.
/// A derived value exists for a period only when its operands do, except that
/// EBITDA counts a missing employee-benefits or other-expenses value as zero.
/// Periods where that happened are listed in the EBITDA item's note.
pub fn calculate_derived_metrics(line_items: &LineItems) -> LineItems {
    let mut calculated = LineItems::new();

    let all_periods: BTreeSet<&str> = line_items
        .values()
        .flat_map(|item| item.periods())
        .collect();

    let lookup = |name: &str, period: &str| line_items.get(name).and_then(|i| i.value(period));

    // Total Revenue: prefer the extracted row; derive it only when absent.
    if !line_items.contains_key(TOTAL_REVENUE)
        && line_items.contains_key(REVENUE_FROM_OPERATIONS)
        && line_items.contains_key(OTHER_INCOME)
    {
        let mut total = LineItem::new(TOTAL_REVENUE);
        for &period in &all_periods {
            if let (Some(ops), Some(other)) = (
                lookup(REVENUE_FROM_OPERATIONS, period),
                lookup(OTHER_INCOME, period),
            ) {
                total.insert(period, ops + other, ValueStatus::Calculated);
            }
        }
        keep_if_computed(&mut calculated, total);
    }

    let revenue = |period: &str| {
        calculated
            .get(TOTAL_REVENUE)
            .and_then(|i| i.value(period))
            .or_else(|| lookup(TOTAL_REVENUE, period))
    };

    let has_revenue = line_items.contains_key(TOTAL_REVENUE) || calculated.contains_key(TOTAL_REVENUE);
    let mut gross_profit = LineItem::new(GROSS_PROFIT);
    if has_revenue && line_items.contains_key(COST_OF_MATERIALS) {
        for &period in &all_periods {
            if let (Some(rev), Some(cogs)) = (revenue(period), lookup(COST_OF_MATERIALS, period)) {
                gross_profit.insert(period, rev - cogs, ValueStatus::Calculated);
            }
        }
    }

    let mut gross_margin = LineItem::new(GROSS_MARGIN);
    let mut ebitda = LineItem::new(EBITDA);
    let mut zero_filled = Vec::new();

    for &period in &all_periods {
        let Some(gp) = gross_profit.value(period) else {
            continue;
        };

        match revenue(period) {
            Some(rev) if rev != 0.0 => {
                gross_margin.insert(period, gp / rev, ValueStatus::Calculated);
            }
            _ => debug!("Skipping gross margin for {}: revenue missing or zero", period),
        }

        let employee = lookup(EMPLOYEE_BENEFITS, period);
        let other = lookup(OTHER_EXPENSES, period);
        if employee.is_none() || other.is_none() {
            zero_filled.push(period);
        }
        ebitda.insert(
            period,
            gp - employee.unwrap_or(0.0) - other.unwrap_or(0.0),
            ValueStatus::Calculated,
        );
    }

    if !zero_filled.is_empty() {
        warn!(
            "EBITDA treats missing operating expenses as zero for {}",
            zero_filled.join(", ")
        );
        ebitda.note = Some(format!(
            "{} or {} missing for {}; treated as zero",
            EMPLOYEE_BENEFITS,
            OTHER_EXPENSES,
            zero_filled.join(", ")
        ));
    }

    keep_if_computed(&mut calculated, gross_profit);
    keep_if_computed(&mut calculated, gross_margin);
    keep_if_computed(&mut calculated, ebitda);

    calculated
}

fn keep_if_computed(calculated: &mut LineItems, item: LineItem) {
    if !item.is_empty() {
        calculated.insert(item.name.clone(), item);
    }
}
