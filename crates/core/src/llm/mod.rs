pub mod anthropic;
pub mod error;
pub mod json;
pub mod ollama;
pub mod prompt;

use crate::config::OracleConfig;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Ollama,
}

/// Remote text-understanding service that turns a question into a query reply.
///
/// Implementations make exactly one bounded HTTP call per `submit` and return the raw
/// reply text; parsing and validation happen in the compiler.
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    fn provider(&self) -> Provider;

    async fn submit(&self, instructions: &str, user_text: &str) -> anyhow::Result<String>;
}

pub fn build_oracle(config: &OracleConfig) -> anyhow::Result<Option<Arc<dyn Oracle>>> {
    let oracle: Arc<dyn Oracle> = match config {
        OracleConfig::Disabled => return Ok(None),
        OracleConfig::Ollama(cfg) => Arc::new(ollama::OllamaClient::new(cfg)?),
        OracleConfig::Anthropic(cfg) => Arc::new(anthropic::AnthropicClient::new(cfg)?),
    };
    tracing::info!(provider = ?oracle.provider(), "oracle configured");
    Ok(Some(oracle))
}
