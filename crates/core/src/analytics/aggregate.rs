use crate::analytics::round_to_cents;
use crate::domain::transaction::Transaction;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingSummary {
    pub total: f64,
    pub transaction_count: usize,
    pub top_categories: Vec<GroupTotal>,
    pub top_merchants: Vec<GroupTotal>,
}

/// Totals posted debits by category and by merchant and keeps the `top_k` of each.
///
/// Tie-break rule: groups with equal totals keep the order in which their first
/// transaction appears in `transactions`. Grouping is insertion-ordered and the ranking
/// sort is stable, so this holds for any input.
pub fn summarize_spending(transactions: &[Transaction], top_k: usize) -> SpendingSummary {
    let mut by_category: IndexMap<&str, f64> = IndexMap::new();
    let mut by_merchant: IndexMap<&str, f64> = IndexMap::new();
    let mut total = 0.0;
    let mut transaction_count = 0;

    for tx in transactions.iter().filter(|t| t.is_posted_debit()) {
        total += tx.amount;
        transaction_count += 1;
        *by_category.entry(tx.merchant.category.as_str()).or_insert(0.0) += tx.amount;
        *by_merchant.entry(tx.merchant.name.as_str()).or_insert(0.0) += tx.amount;
    }

    SpendingSummary {
        total: round_to_cents(total),
        transaction_count,
        top_categories: top_groups(by_category, top_k),
        top_merchants: top_groups(by_merchant, top_k),
    }
}

fn top_groups(groups: IndexMap<&str, f64>, top_k: usize) -> Vec<GroupTotal> {
    let mut ranked: Vec<(&str, f64)> = groups.into_iter().collect();
    // Stable: equal totals stay in first-seen order.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(top_k)
        .map(|(key, total)| GroupTotal {
            key: key.to_string(),
            total: round_to_cents(total),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{Direction, Merchant};
    use chrono::{TimeZone, Utc};

    fn tx(merchant: &str, category: &str, amount: f64) -> Transaction {
        Transaction {
            id: format!("t-{merchant}-{amount}"),
            account_id: "A123".to_string(),
            posted_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            direction: Direction::Debit,
            amount,
            merchant: Merchant {
                name: merchant.to_string(),
                category: category.to_string(),
                subcategory: "General".to_string(),
            },
            is_pending: false,
            payment_rail: None,
            card_last4: None,
        }
    }

    fn keys(groups: &[GroupTotal]) -> Vec<&str> {
        groups.iter().map(|g| g.key.as_str()).collect()
    }

    #[test]
    fn totals_only_posted_debits() {
        let mut pending = tx("Grocer", "Groceries", 100.0);
        pending.is_pending = true;
        let mut salary = tx("Employer", "Income", 3000.0);
        salary.direction = Direction::Credit;

        let txs = vec![tx("Grocer", "Groceries", 50.25), pending, salary, tx("Cafe", "Dining", 4.75)];
        let summary = summarize_spending(&txs, 5);
        assert_eq!(summary.total, 55.0);
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(keys(&summary.top_categories), vec!["Groceries", "Dining"]);
    }

    #[test]
    fn ties_break_by_first_seen_order() {
        let txs = vec![
            tx("Zed Books", "Books", 20.0),
            tx("Alpha Games", "Games", 20.0),
            tx("Mid Music", "Music", 20.0),
        ];
        let summary = summarize_spending(&txs, 5);
        assert_eq!(keys(&summary.top_merchants), vec!["Zed Books", "Alpha Games", "Mid Music"]);
        assert_eq!(keys(&summary.top_categories), vec!["Books", "Games", "Music"]);

        let reversed: Vec<_> = txs.into_iter().rev().collect();
        let summary = summarize_spending(&reversed, 5);
        assert_eq!(keys(&summary.top_merchants), vec!["Mid Music", "Alpha Games", "Zed Books"]);
    }

    #[test]
    fn keeps_top_k_by_summed_amount() {
        let txs = vec![
            tx("A", "Travel", 10.0),
            tx("B", "Dining", 30.0),
            tx("A", "Travel", 25.0),
            tx("C", "Groceries", 5.0),
        ];
        let summary = summarize_spending(&txs, 2);
        assert_eq!(keys(&summary.top_merchants), vec!["A", "B"]);
        assert_eq!(summary.top_merchants[0].total, 35.0);
        assert_eq!(summary.top_categories.len(), 2);
    }
}
