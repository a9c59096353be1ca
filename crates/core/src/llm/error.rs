use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// Oracle call that reached the provider but produced nothing usable.
#[derive(Debug, Clone)]
pub struct OracleDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl OracleDiagnosticsError {
    pub fn http(provider: Provider, status: reqwest::StatusCode, body: String) -> Self {
        Self {
            provider,
            stage: "http",
            detail: format!("status={status}"),
            raw_response_json: serde_json::from_str::<Value>(&body).ok(),
            raw_output: Some(body),
        }
    }

    pub fn empty_reply(provider: Provider, raw_response_json: Value) -> Self {
        Self {
            provider,
            stage: "empty_reply",
            detail: "reply carried no text or tool output".to_string(),
            raw_output: None,
            raw_response_json: Some(raw_response_json),
        }
    }
}

impl fmt::Display for OracleDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "oracle error (provider={:?}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for OracleDiagnosticsError {}
