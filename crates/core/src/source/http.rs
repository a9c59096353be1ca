use crate::config::SourceConfig;
use crate::domain::transaction::Transaction;
use crate::source::{DataSourceError, TransactionSource};
use crate::time::calendar::DateWindow;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

const TRANSACTIONS_PATH: [&str; 2] = ["tool", "transactions"];

/// Client for the transaction tool API. One request per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpTransactionSource {
    http: reqwest::Client,
    collection_url: Url,
    api_key: Option<String>,
}

impl HttpTransactionSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build transaction source http client")?;

        let mut collection_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid TOOL_BASE_URL: {}", config.base_url))?;
        collection_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("TOOL_BASE_URL cannot carry a path: {}", config.base_url))?
            .pop_if_empty()
            .extend(TRANSACTIONS_PATH);

        Ok(Self {
            http,
            collection_url,
            api_key: config.api_key.clone(),
        })
    }

    /// The id is pushed as a single percent-encoded path segment.
    fn url(&self, transaction_id: Option<&str>) -> Result<Url> {
        let mut url = self.collection_url.clone();
        if let Some(id) = transaction_id {
            url.path_segments_mut()
                .map_err(|_| anyhow::anyhow!("transaction source url cannot carry a path"))?
                .push(id);
        }
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    /// Returns `Ok(None)` on 404 so callers can raise a typed not-found.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let res = self
            .http
            .get(url)
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .context("transaction source request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read transaction source response")?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("transaction source HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<T>(&text)
            .with_context(|| format!("transaction source response has unexpected shape: {text}"))?;
        Ok(Some(parsed))
    }
}

#[async_trait::async_trait]
impl TransactionSource for HttpTransactionSource {
    fn source_name(&self) -> &'static str {
        "tool_api"
    }

    async fn fetch_by_window(&self, account_id: &str, window: DateWindow) -> Result<Vec<Transaction>> {
        let query = [
            ("accountId", account_id.to_string()),
            ("start", window.start.to_string()),
            ("end", window.end.to_string()),
        ];
        let txs = self
            .get_json::<Vec<Transaction>>(self.url(None).map_err(DataSourceError::Transport)?, &query)
            .await
            .map_err(DataSourceError::Transport)?
            .unwrap_or_default();
        tracing::debug!(account_id, start = %window.start, end = %window.end, count = txs.len(), "fetched transactions");
        Ok(txs)
    }

    async fn fetch_by_id(&self, account_id: &str, transaction_id: &str) -> Result<Transaction> {
        let not_found = || DataSourceError::NotFound {
            account_id: account_id.to_string(),
            transaction_id: transaction_id.to_string(),
        };
        // "." and ".." are dropped by path-segment encoding and would address the collection.
        if matches!(transaction_id.trim(), "" | "." | "..") {
            return Err(not_found().into());
        }

        let query = [("accountId", account_id.to_string())];
        let url = self.url(Some(transaction_id)).map_err(DataSourceError::Transport)?;
        let tx = self
            .get_json::<Transaction>(url, &query)
            .await
            .map_err(DataSourceError::Transport)?;
        tx.ok_or_else(|| not_found().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn source(base_url: &str) -> HttpTransactionSource {
        HttpTransactionSource::new(&SourceConfig {
            base_url: base_url.to_string(),
            api_key: Some("secret".to_string()),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn builds_tool_urls() {
        let s = source("http://localhost:8000/");
        assert_eq!(s.url(None).unwrap().as_str(), "http://localhost:8000/tool/transactions");
        assert_eq!(
            s.url(Some("t016")).unwrap().as_str(),
            "http://localhost:8000/tool/transactions/t016"
        );

        let prefixed = source("http://gateway/bank/");
        assert_eq!(
            prefixed.url(Some("t016")).unwrap().as_str(),
            "http://gateway/bank/tool/transactions/t016"
        );
    }

    #[test]
    fn transaction_id_stays_one_path_segment() {
        let s = source("http://tool");
        let url = s.url(Some("../admin?accountId=B999#x")).unwrap();
        assert_eq!(url.path(), "/tool/transactions/..%2Fadmin%3FaccountId=B999%23x");
        assert_eq!(url.query(), None);

        let req = s
            .http
            .get(url)
            .query(&[("accountId", "A123")])
            .build()
            .unwrap();
        assert_eq!(req.url().query(), Some("accountId=A123"));
    }

    #[tokio::test]
    async fn dot_segment_ids_are_not_found() {
        let s = source("http://tool");
        for id in ["..", ".", " "] {
            let err = s.fetch_by_id("A123", id).await.unwrap_err();
            assert!(err.downcast_ref::<DataSourceError>().is_some_and(DataSourceError::is_not_found));
        }
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(HttpTransactionSource::new(&SourceConfig {
            base_url: "not a url".to_string(),
            api_key: None,
            timeout: Duration::from_secs(1),
        })
        .is_err());
    }

    #[test]
    fn sends_api_key_header() {
        let headers = source("http://localhost:8000").headers().unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
    }
}
