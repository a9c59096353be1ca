use crate::domain::transaction::Transaction;
use crate::source::{DataSourceError, TransactionSource};
use crate::time::calendar::DateWindow;
use anyhow::{Context, Result};
use std::path::Path;

/// Fixed set of transactions, typically loaded from a JSON fixture (an array in the same
/// shape the tool API serves).
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionSource {
    transactions: Vec<Transaction>,
}

impl InMemoryTransactionSource {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let transactions = serde_json::from_str::<Vec<Transaction>>(json)
            .context("fixture is not a JSON array of transactions")?;
        Ok(Self::new(transactions))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("invalid fixture {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[async_trait::async_trait]
impl TransactionSource for InMemoryTransactionSource {
    fn source_name(&self) -> &'static str {
        "in_memory"
    }

    async fn fetch_by_window(&self, account_id: &str, window: DateWindow) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .iter()
            .filter(|tx| tx.account_id == account_id && window.contains(tx.posted_at.date_naive()))
            .cloned()
            .collect())
    }

    async fn fetch_by_id(&self, account_id: &str, transaction_id: &str) -> Result<Transaction> {
        self.transactions
            .iter()
            .find(|tx| tx.account_id == account_id && tx.id == transaction_id)
            .cloned()
            .ok_or_else(|| {
                DataSourceError::NotFound {
                    account_id: account_id.to_string(),
                    transaction_id: transaction_id.to_string(),
                }
                .into()
            })
    }
}
