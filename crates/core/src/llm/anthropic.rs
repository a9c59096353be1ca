use crate::config::AnthropicConfig;
use crate::llm::error::OracleDiagnosticsError;
use crate::llm::{Oracle, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";

const TOOL_NAME_EMIT_QUERY: &str = "emit_query";

/// Anthropic Messages API with a forced `emit_query` tool call.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: &AnthropicConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    async fn create_message(
        &self,
        req: &CreateMessageRequest<'_>,
    ) -> anyhow::Result<(serde_json::Value, CreateMessageResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            return Err(OracleDiagnosticsError::http(Provider::Anthropic, status, text).into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Anthropic response JSON: {text}"))?;
        let parsed = serde_json::from_value::<CreateMessageResponse>(raw_json.clone())
            .context("failed to decode Anthropic response into CreateMessageResponse")?;
        Ok((raw_json, parsed))
    }

    fn tools() -> Vec<Tool> {
        let time_range = serde_json::json!({
            "type": ["object", "null"],
            "properties": {
                "mode": {"type": "string", "enum": ["preset", "relative", "custom"]},
                "preset": {"type": ["string", "null"], "enum": ["ytd", "this_month", "last_month", null]},
                "last": {"type": ["integer", "null"], "minimum": 1},
                "unit": {"type": ["string", "null"], "enum": ["days", "weeks", "months", "years", null]},
                "start": {"type": ["string", "null"]},
                "end": {"type": ["string", "null"]}
            }
        });
        let schema = serde_json::json!({
            "type": "object",
            "required": ["is_banking_domain", "query"],
            "properties": {
                "is_banking_domain": {"type": ["boolean", "null"]},
                "query": {
                    "type": "object",
                    "required": ["intent", "time_range", "params"],
                    "properties": {
                        "intent": {
                            "type": "string",
                            "enum": [
                                "top_spending_ytd",
                                "transactions_list",
                                "recurring_payments",
                                "unrecognized_transaction"
                            ]
                        },
                        "time_range": time_range,
                        "params": {"type": "object"}
                    }
                }
            }
        });

        vec![Tool {
            name: TOOL_NAME_EMIT_QUERY,
            description: "Emit the structured banking query for the user's question",
            input_schema: schema,
        }]
    }

    fn tool_choice() -> ToolChoice {
        ToolChoice::Tool {
            name: TOOL_NAME_EMIT_QUERY,
        }
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            if let ContentBlock::Text { text } = block {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }

    fn response_tool_input(res: &CreateMessageResponse) -> Option<&serde_json::Value> {
        res.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } if name == TOOL_NAME_EMIT_QUERY => Some(input),
            _ => None,
        })
    }
}

#[async_trait::async_trait]
impl Oracle for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn submit(&self, instructions: &str, user_text: &str) -> anyhow::Result<String> {
        let req = CreateMessageRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: Some(instructions),
            messages: vec![Message {
                role: "user",
                content: user_text,
            }],
            tools: Some(Self::tools()),
            tool_choice: Some(Self::tool_choice()),
        };

        let (raw_json, res) = self.create_message(&req).await?;
        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::warn!(max_tokens = self.max_tokens, "Anthropic stop_reason=max_tokens");
        }

        // Tool output path.
        if let Some(input) = Self::response_tool_input(&res) {
            return Ok(input.to_string());
        }

        // Fallback to text (should be rare).
        let text = Self::response_text(&res);
        if text.trim().is_empty() {
            return Err(OracleDiagnosticsError::empty_reply(Provider::Anthropic, raw_json).into());
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: &'static str },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },

    #[serde(other)]
    Unknown,
}
