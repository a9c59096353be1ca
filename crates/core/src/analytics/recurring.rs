use crate::analytics::cadence::{classify_gaps, Cadence};
use crate::analytics::round_to_cents;
use crate::domain::transaction::Transaction;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// Derived per request and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPayment {
    pub merchant: String,
    pub cadence: Cadence,
    pub confidence: f64,
    pub average_amount: f64,
    pub occurrences: usize,
    pub last_seen_at: DateTime<Utc>,
}

/// Finds merchants charged on a regular cadence.
///
/// Only posted debits count. Merchants are grouped in first-seen order, groups below
/// `min_occurrences` are dropped, and the median gap between consecutive charge dates is
/// classified. Merchants whose cadence is unknown are dropped. Output is ordered by
/// occurrences, then average amount, both descending; full ties keep first-seen order.
pub fn detect_recurring(transactions: &[Transaction], min_occurrences: usize) -> Vec<RecurringPayment> {
    let mut by_merchant: IndexMap<&str, Vec<&Transaction>> = IndexMap::new();
    for tx in transactions.iter().filter(|t| t.is_posted_debit()) {
        by_merchant.entry(tx.merchant.name.as_str()).or_default().push(tx);
    }

    let mut out = Vec::new();
    for (merchant, mut items) in by_merchant {
        if items.len() < min_occurrences {
            continue;
        }

        items.sort_by_key(|t| t.posted_at);
        let gaps: Vec<i64> = items
            .windows(2)
            .map(|pair| (pair[1].posted_at.date_naive() - pair[0].posted_at.date_naive()).num_days())
            .collect();
        if gaps.is_empty() {
            continue;
        }

        let cadence = classify_gaps(&gaps);
        if cadence.cadence == Cadence::Unknown {
            tracing::debug!(
                merchant,
                median_gap_days = cadence.median_gap_days,
                confidence = cadence.confidence,
                "repeated merchant has no regular cadence"
            );
            continue;
        }

        let total: f64 = items.iter().map(|t| t.amount).sum();
        let Some(last) = items.last() else {
            continue;
        };

        out.push(RecurringPayment {
            merchant: merchant.to_string(),
            cadence: cadence.cadence,
            confidence: cadence.confidence,
            average_amount: round_to_cents(total / items.len() as f64),
            occurrences: items.len(),
            last_seen_at: last.posted_at,
        });
    }

    out.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| b.average_amount.total_cmp(&a.average_amount))
    });
    out
}
