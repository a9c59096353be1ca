pub mod format;

use crate::analytics::aggregate::{summarize_spending, GroupTotal};
use crate::analytics::recurring::detect_recurring;
use crate::domain::query::{QuerySpec, DEFAULT_LIMIT};
use crate::domain::transaction::{PaymentRail, Transaction};
use crate::domain::ui::{
    ChartKind, UiAction, UiChart, UiComponent, UiForm, UiFormField, UiPayload, UiTable,
};
use crate::views::format::{describe_range, money};
use serde_json::{json, Map, Value};

pub const MAX_RECURRING_ROWS: usize = 25;
pub const DISPUTE_FORM_ID: &str = "dispute_transaction_v1";

const TRANSACTION_COLUMNS: [&str; 10] = [
    "id",
    "date",
    "status",
    "merchant",
    "category",
    "subcategory",
    "amount",
    "direction",
    "payment_rail",
    "card_last4",
];

const RECURRING_COLUMNS: [&str; 5] = ["merchant", "cadence", "avg_amount", "occurrences", "last_seen"];

pub fn domain_clarification() -> UiPayload {
    UiPayload::message(
        "I can help with questions about your account: recent transactions, top spending this year, \
recurring payments and subscriptions, or a charge you don't recognize. What would you like to check?",
    )
}

pub fn missing_identifier() -> UiPayload {
    UiPayload::message(
        "Which transaction do you mean? Select a row in the transactions table or include its id (for example t016).",
    )
}

/// Newest first, capped at `limit` (default 50). Pending rows are dropped when
/// `include_pending` is false.
pub fn transactions_list(spec: &QuerySpec, transactions: &[Transaction]) -> UiPayload {
    let limit = spec.params.limit().unwrap_or(DEFAULT_LIMIT);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let include_pending = spec.params.include_pending();

    let mut rows: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| include_pending || tx.is_posted())
        .collect();
    rows.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
    rows.truncate(limit);

    let table = UiTable {
        title: "Transactions".to_string(),
        columns: columns(&TRANSACTION_COLUMNS),
        rows: rows.iter().map(|tx| transaction_row(tx)).collect(),
    };

    UiPayload::message(format!(
        "Here are your transactions from **{}** (showing **{}**).",
        describe_range(spec),
        table.rows.len()
    ))
    .with_component(UiComponent::Table(table))
}

pub fn top_spending(spec: &QuerySpec, transactions: &[Transaction]) -> UiPayload {
    let top_k = usize::try_from(spec.params.top_k()).unwrap_or(usize::MAX);
    let summary = summarize_spending(transactions, top_k);

    UiPayload::message(format!(
        "Total spending (posted debits): **{}**",
        money(summary.total)
    ))
    .with_component(UiComponent::Chart(UiChart {
        chart_type: ChartKind::Pie,
        title: format!("Top {} categories", summary.top_categories.len()),
        data: chart_points("category", &summary.top_categories),
    }))
    .with_component(UiComponent::Chart(UiChart {
        chart_type: ChartKind::Bar,
        title: format!("Top {} merchants", summary.top_merchants.len()),
        data: chart_points("merchant", &summary.top_merchants),
    }))
}

pub fn recurring_payments(spec: &QuerySpec, transactions: &[Transaction]) -> UiPayload {
    let min_occurrences = usize::try_from(spec.params.min_occurrences()).unwrap_or(usize::MAX);
    let recurring = detect_recurring(transactions, min_occurrences);

    let rows = recurring
        .iter()
        .take(MAX_RECURRING_ROWS)
        .map(|r| {
            vec![
                json!(r.merchant),
                json!(r.cadence.as_str()),
                json!(money(r.average_amount)),
                json!(r.occurrences.to_string()),
                json!(r.last_seen_at.date_naive().to_string()),
            ]
        })
        .collect();

    UiPayload::message(format!(
        "Found **{}** likely recurring payments (posted debits only).",
        recurring.len()
    ))
    .with_component(UiComponent::Table(UiTable {
        title: "Recurring payments / subscriptions".to_string(),
        columns: columns(&RECURRING_COLUMNS),
        rows,
    }))
}

/// Explanation of a single charge plus a prefilled dispute form.
pub fn unrecognized_transaction(tx: &Transaction) -> UiPayload {
    let mut lines = vec![
        "Here\u{2019}s what I see for that transaction:".to_string(),
        format!(
            "- Merchant: **{}** ({} / {})",
            tx.merchant.name, tx.merchant.category, tx.merchant.subcategory
        ),
        format!("- Amount: **{}** ({})", money(tx.amount), tx.direction.as_str()),
        format!("- Date: **{}**", tx.posted_at.date_naive()),
        format!("- Status: **{}**", tx.status_label()),
    ];

    if let Some(rail) = tx.payment_rail {
        let method = match (rail, tx.card_last4.as_deref()) {
            (PaymentRail::Card, Some(last4)) => format!("Card (card \u{2022}\u{2022}\u{2022}\u{2022} {last4})"),
            _ => rail.as_str().to_string(),
        };
        lines.push(format!("- Method: **{method}**"));
    }

    lines.push(String::new());
    if tx.is_pending {
        lines.push(
            "Pending card charges can change slightly when posted, or disappear if canceled.".to_string(),
        );
        lines.push(
            "If you still don\u{2019}t recognize it after it posts, you can start a dispute below.".to_string(),
        );
    } else {
        lines.push(
            "If you don\u{2019}t recognize it, you can start a dispute below (a team member will review)."
                .to_string(),
        );
    }

    UiPayload::message(lines.join("\n")).with_component(UiComponent::Form(dispute_form(tx)))
}

fn dispute_form(tx: &Transaction) -> UiForm {
    let field = |name: &str, label: &str, value: String, required: bool| UiFormField {
        name: name.to_string(),
        label: label.to_string(),
        value: Value::String(value),
        required,
    };

    UiForm {
        form_id: DISPUTE_FORM_ID.to_string(),
        title: "Report an unrecognized transaction".to_string(),
        fields: vec![
            field("transactionId", "Transaction ID", tx.id.clone(), true),
            field("merchant", "Merchant", tx.merchant.name.clone(), true),
            field("date", "Date", tx.posted_at.date_naive().to_string(), true),
            field("amount", "Amount", money(tx.amount), true),
            field(
                "reason",
                "Reason (not mine / duplicate / wrong amount)",
                String::new(),
                true,
            ),
            field("notes", "Notes (optional)", String::new(), false),
        ],
        actions: vec![UiAction {
            kind: "submit".to_string(),
            label: "Start dispute".to_string(),
        }],
    }
}

fn transaction_row(tx: &Transaction) -> Vec<Value> {
    vec![
        json!(tx.id),
        json!(tx.posted_at.date_naive().to_string()),
        json!(tx.status_label()),
        json!(tx.merchant.name),
        json!(tx.merchant.category),
        json!(tx.merchant.subcategory),
        json!(money(tx.amount)),
        json!(tx.direction.as_str()),
        json!(tx.payment_rail.map(PaymentRail::as_str).unwrap_or_default()),
        json!(tx.card_last4.as_deref().unwrap_or_default()),
    ]
}

fn chart_points(label: &str, groups: &[GroupTotal]) -> Vec<Map<String, Value>> {
    groups
        .iter()
        .map(|g| {
            let mut point = Map::new();
            point.insert(label.to_string(), json!(g.key));
            point.insert("total".to_string(), json!(g.total));
            point
        })
        .collect()
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}
