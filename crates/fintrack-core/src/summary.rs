//! Dashboard totals over a set of records

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::FinancialRecord;

/// Total for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: String,
    pub count: usize,
}

/// Income, spending and net over the user's records
///
/// Amounts are summed as decimals and rendered with two places. Sums that
/// leave the decimal range stick at its bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub count: usize,
    pub total_income: String,
    pub total_expenses: String,
    pub net_total: String,
    /// In order of first appearance
    pub categories: Vec<CategoryTotal>,
}

impl RecordSummary {
    pub fn from_records(records: &[FinancialRecord]) -> Self {
        let mut income = Decimal::ZERO;
        let mut expenses = Decimal::ZERO;
        let mut categories: Vec<(String, Decimal, usize)> = Vec::new();

        for record in records {
            let amount = to_decimal(record.amount);
            if amount.is_sign_negative() {
                expenses = expenses.saturating_add(amount);
            } else {
                income = income.saturating_add(amount);
            }

            match categories.iter_mut().find(|(name, _, _)| *name == record.category) {
                Some((_, total, count)) => {
                    *total = total.saturating_add(amount);
                    *count += 1;
                }
                None => categories.push((record.category.clone(), amount, 1)),
            }
        }

        Self {
            count: records.len(),
            total_income: format_decimal(income),
            total_expenses: format_decimal(expenses),
            net_total: format_decimal(income.saturating_add(expenses)),
            categories: categories
                .into_iter()
                .map(|(category, total, count)| CategoryTotal {
                    category,
                    total: format_decimal(total),
                    count,
                })
                .collect(),
        }
    }
}

// Non-finite amounts count as zero.
fn to_decimal(amount: f64) -> Decimal {
    Decimal::from_f64(amount).unwrap_or(Decimal::ZERO)
}

fn format_decimal(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded.is_zero() {
        "0.00".to_string()
    } else {
        format!("{:.2}", rounded)
    }
}
