pub mod http;
pub mod memory;

use crate::domain::transaction::Transaction;
use crate::time::calendar::DateWindow;
use std::fmt;

/// Read-only access to an account's transactions.
#[async_trait::async_trait]
pub trait TransactionSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Transactions posted inside the half-open `window`.
    async fn fetch_by_window(
        &self,
        account_id: &str,
        window: DateWindow,
    ) -> anyhow::Result<Vec<Transaction>>;

    async fn fetch_by_id(&self, account_id: &str, transaction_id: &str)
        -> anyhow::Result<Transaction>;
}

/// Failure talking to a transaction source. Carried inside `anyhow::Error` and recovered
/// with `downcast_ref` where the HTTP status is chosen.
#[derive(Debug)]
pub enum DataSourceError {
    NotFound {
        account_id: String,
        transaction_id: String,
    },
    Transport(anyhow::Error),
}

impl DataSourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataSourceError::NotFound { .. })
    }
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NotFound {
                account_id,
                transaction_id,
            } => write!(
                f,
                "transaction {transaction_id} not found for account {account_id}"
            ),
            DataSourceError::Transport(err) => write!(f, "transaction source failed: {err:#}"),
        }
    }
}

impl std::error::Error for DataSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataSourceError::NotFound { .. } => None,
            DataSourceError::Transport(err) => Some(err.as_ref()),
        }
    }
}
