use crate::config::OllamaConfig;
use crate::llm::error::OracleDiagnosticsError;
use crate::llm::{Oracle, Provider};
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Chat endpoint of a local Ollama server. Works against both the OpenAI-compatible
/// `/v1/chat/completions` route and the native `/api/chat` route.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            url: config.url.clone(),
            model: config.model.clone(),
        })
    }

    fn reply_content(res: ChatResponse) -> Option<String> {
        let message = match res.choices.into_iter().next() {
            Some(choice) => choice.message,
            None => res.message?,
        };
        Some(message.content).filter(|c| !c.trim().is_empty())
    }
}

#[async_trait::async_trait]
impl Oracle for OllamaClient {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    async fn submit(&self, instructions: &str, user_text: &str) -> anyhow::Result<String> {
        let req = ChatRequest {
            model: &self.model,
            stream: false,
            messages: vec![
                Message {
                    role: "system",
                    content: instructions,
                },
                Message {
                    role: "user",
                    content: user_text,
                },
            ],
            format: "json",
        };

        let res = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .context("Ollama request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Ollama response body")?;
        if !status.is_success() {
            return Err(OracleDiagnosticsError::http(Provider::Ollama, status, text).into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Ollama response JSON: {text}"))?;
        let parsed = serde_json::from_value::<ChatResponse>(raw_json.clone())
            .context("failed to decode Ollama chat response")?;

        tracing::debug!(model = %self.model, "Ollama reply received");
        Self::reply_content(parsed)
            .ok_or_else(|| OracleDiagnosticsError::empty_reply(Provider::Ollama, raw_json).into())
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<Message<'a>>,
    format: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    message: Option<ReplyMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}
