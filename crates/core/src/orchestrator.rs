use crate::compiler::QueryCompiler;
use crate::domain::envelope::{ChatRequest, ChatResponse, ConversationContext};
use crate::domain::query::{Intent, QuerySpec, TimeRangeSpec};
use crate::domain::ui::UiPayload;
use crate::source::TransactionSource;
use crate::time::calendar::{resolve_window, DateWindow};
use crate::views;
use chrono::NaiveDate;
use std::sync::Arc;

/// Lookback used to find the N most recent transactions of a count-only query.
pub const LIMIT_ONLY_LOOKBACK_DAYS: u32 = 180;

/// Request envelope in, response envelope out. Only data-source failures escape.
pub struct Orchestrator {
    compiler: QueryCompiler,
    source: Arc<dyn TransactionSource>,
}

impl Orchestrator {
    pub fn new(compiler: QueryCompiler, source: Arc<dyn TransactionSource>) -> Self {
        Self { compiler, source }
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    pub async fn handle(&self, req: &ChatRequest, today: NaiveDate) -> anyhow::Result<ChatResponse> {
        let query = self
            .compiler
            .compile(&req.message, req.context.as_ref())
            .await;
        let ui = self
            .answer(&req.account_id, &query, req.context.as_ref(), today)
            .await?;
        Ok(ChatResponse { query, ui })
    }

    pub async fn answer(
        &self,
        account_id: &str,
        query: &QuerySpec,
        context: Option<&ConversationContext>,
        today: NaiveDate,
    ) -> anyhow::Result<UiPayload> {
        if !query.is_banking_domain.is_banking() {
            tracing::info!(flag = ?query.is_banking_domain, "outside banking domain; asking to clarify");
            return Ok(views::domain_clarification());
        }

        match query.intent {
            Intent::UnrecognizedTransaction => {
                let transaction_id = query
                    .params
                    .transaction_id()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .or_else(|| context.and_then(|c| c.selected()));
                let Some(transaction_id) = transaction_id else {
                    return Ok(views::missing_identifier());
                };
                let tx = self.source.fetch_by_id(account_id, transaction_id).await?;
                Ok(views::unrecognized_transaction(&tx))
            }
            Intent::TransactionsList => {
                let txs = self.fetch_window(account_id, query, today).await?;
                Ok(views::transactions_list(query, &txs))
            }
            Intent::TopSpendingYtd => {
                let txs = self.fetch_window(account_id, query, today).await?;
                Ok(views::top_spending(query, &txs))
            }
            Intent::RecurringPayments => {
                let txs = self.fetch_window(account_id, query, today).await?;
                Ok(views::recurring_payments(query, &txs))
            }
        }
    }

    async fn fetch_window(
        &self,
        account_id: &str,
        query: &QuerySpec,
        today: NaiveDate,
    ) -> anyhow::Result<Vec<crate::domain::transaction::Transaction>> {
        let window = fetch_window(query, today);
        tracing::debug!(
            source = self.source.source_name(),
            start = %window.start,
            end = %window.end,
            "fetching transactions"
        );
        self.source.fetch_by_window(account_id, window).await
    }
}

/// Date window to read for a windowed query.
pub fn fetch_window(query: &QuerySpec, today: NaiveDate) -> DateWindow {
    if query.params.limit_only() {
        let lookback = TimeRangeSpec::trailing_days(LIMIT_ONLY_LOOKBACK_DAYS);
        return resolve_window(Some(&lookback), today);
    }
    resolve_window(query.time_range.as_ref(), today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ui::UiComponent;
    use crate::llm::{Oracle, Provider};
    use crate::source::memory::InMemoryTransactionSource;
    use crate::source::DataSourceError;
    use serde_json::{json, Value};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn tx(id: &str, merchant: &str, date: &str, amount: f64, pending: bool) -> Value {
        json!({
            "id": id,
            "accountId": "A123",
            "postedAt": format!("{date}T12:00:00Z"),
            "direction": "debit",
            "amount": amount,
            "merchant": {"name": merchant, "category": "Entertainment", "subcategory": "Streaming"},
            "isPending": pending,
            "paymentRail": "Card",
            "cardLast4": "4242"
        })
    }

    fn fixture() -> Arc<dyn TransactionSource> {
        let txs = json!([
            tx("t001", "Acme", "2024-02-20", 9.99, false),
            tx("t002", "Acme", "2024-03-21", 9.99, false),
            tx("t003", "Acme", "2024-04-20", 9.99, false),
            tx("t004", "Acme", "2024-05-20", 9.99, false),
            tx("t005", "Acme", "2024-06-14", 9.99, true),
            tx("t006", "Bookshop", "2024-06-10", 45.0, false),
            tx("t007", "Bookshop", "2023-12-30", 12.0, false),
        ]);
        Arc::new(InMemoryTransactionSource::from_json_str(&txs.to_string()).unwrap())
    }

    fn orchestrator(oracle: Option<Arc<dyn Oracle>>) -> Orchestrator {
        Orchestrator::new(QueryCompiler::new(oracle).unwrap(), fixture())
    }

    fn request(message: &str, selected: Option<&str>) -> ChatRequest {
        ChatRequest {
            account_id: "A123".to_string(),
            message: message.to_string(),
            context: selected.map(|id| ConversationContext {
                selected_transaction_id: Some(id.to_string()),
            }),
        }
    }

    fn first_table_ids(res: &ChatResponse) -> Vec<String> {
        match &res.ui.components[0] {
            UiComponent::Table(t) => t.rows.iter().map(|r| r[0].as_str().unwrap().to_string()).collect(),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn count_only_reads_lookback_and_keeps_newest() {
        let res = orchestrator(None)
            .handle(&request("give me 2 transactions", None), today())
            .await
            .unwrap();
        assert!(res.query.params.limit_only());
        assert_eq!(first_table_ids(&res), vec!["t005", "t006"]);
        assert!(res.ui.messages[0].content.contains("your most recent activity"));
    }

    #[test]
    fn count_only_window_is_180_days() {
        let q = QuerySpec::safe_default()
            .with_time_range(None)
            .with_params(crate::domain::query::Params::new().with("limit_only", true));
        let w = fetch_window(&q, today());
        assert_eq!(w.start, NaiveDate::from_ymd_opt(2023, 12, 18).unwrap());
        assert_eq!(w.end, NaiveDate::from_ymd_opt(2024, 6, 16).unwrap());
    }

    #[tokio::test]
    async fn recurring_excludes_pending() {
        let res = orchestrator(None)
            .handle(&request("show my subscriptions from the last 6 months", None), today())
            .await
            .unwrap();
        assert_eq!(res.query.intent, Intent::RecurringPayments);
        let UiComponent::Table(t) = &res.ui.components[0] else {
            panic!("expected table");
        };
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0][0], json!("Acme"));
        assert_eq!(t.rows[0][1], json!("monthly"));
        assert_eq!(t.rows[0][3], json!("4"));
    }

    #[tokio::test]
    async fn top_spending_uses_year_to_date() {
        let res = orchestrator(None)
            .handle(&request("What are my top spendings this year?", None), today())
            .await
            .unwrap();
        // 4 posted Acme charges plus the June bookshop order; December is last year.
        assert_eq!(res.ui.messages[0].content, "Total spending (posted debits): **$84.96**");
    }

    #[tokio::test]
    async fn unrecognized_uses_selected_row() {
        let res = orchestrator(None)
            .handle(&request("I don't recognize this transaction", Some("t006")), today())
            .await
            .unwrap();
        assert_eq!(res.query.params.transaction_id(), Some("t006"));
        assert!(matches!(res.ui.components[0], UiComponent::Form(_)));
        assert!(res.ui.messages[0].content.contains("Bookshop"));
    }

    #[tokio::test]
    async fn unrecognized_without_id_asks_which_one() {
        let res = orchestrator(None)
            .handle(&request("I don't recognize this transaction", None), today())
            .await
            .unwrap();
        assert!(res.ui.components.is_empty());
        assert!(res.ui.messages[0].content.starts_with("Which transaction"));
    }

    #[tokio::test]
    async fn unknown_id_is_an_upstream_failure() {
        let err = orchestrator(None)
            .handle(&request("what is this charge t999", None), today())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<DataSourceError>().unwrap().is_not_found());
    }

    struct OffTopicOracle;

    #[async_trait::async_trait]
    impl Oracle for OffTopicOracle {
        fn provider(&self) -> Provider {
            Provider::Ollama
        }

        async fn submit(&self, _instructions: &str, _user_text: &str) -> anyhow::Result<String> {
            Ok(json!({
                "is_banking_domain": null,
                "query": {"intent": "transactions_list", "time_range": null, "params": {"limit": 10}}
            })
            .to_string())
        }
    }

    #[tokio::test]
    async fn non_banking_question_gets_clarification() {
        let res = orchestrator(Some(Arc::new(OffTopicOracle)))
            .handle(&request("asdf qwer", None), today())
            .await
            .unwrap();
        assert!(res.ui.components.is_empty());
        assert!(res.ui.messages[0].content.starts_with("I can help with questions about your account"));
    }
}
