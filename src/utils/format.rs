//! Display helpers for fee statements

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::types::ReconciledFee;

/// Format an amount as whole rupees with Indian digit grouping, e.g. `₹ 1,00,000`
pub fn format_currency(amount: &BigDecimal) -> String {
    let (whole, _) = amount.with_scale(0).as_bigint_and_exponent();
    let digits = whole.to_string();
    match digits.strip_prefix('-') {
        Some(magnitude) => format!("₹ -{}", group_indian(magnitude)),
        None => format!("₹ {}", group_indian(&digits)),
    }
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (mut head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    while head.len() > 2 {
        let (rest, group) = head.split_at(head.len() - 2);
        groups.push(group);
        head = rest;
    }
    if !head.is_empty() {
        groups.push(head);
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Format a date as `5 Jan 2024`, or the placeholder when absent
pub fn format_date(date: Option<NaiveDate>, placeholder: &str) -> String {
    match date {
        Some(date) => date.format("%-d %b %Y").to_string(),
        None => placeholder.to_string(),
    }
}

/// Fees whose due date falls within `[from, to]`
///
/// With no bounds every fee is returned; with any bound, fees without a due
/// date are left out.
pub fn fees_due_between(
    fees: &[ReconciledFee],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<&ReconciledFee> {
    if from.is_none() && to.is_none() {
        return fees.iter().collect();
    }

    fees.iter()
        .filter(|fee| match fee.fee.due_date {
            Some(due) => from.is_none_or(|f| due >= f) && to.is_none_or(|t| due <= t),
            None => false,
        })
        .collect()
}
