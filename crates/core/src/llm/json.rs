use crate::domain::contract::LlmQueryReply;
use anyhow::Context;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.split_once('\n').map(|(_, rest)| rest) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

pub fn parse_reply(text: &str) -> anyhow::Result<LlmQueryReply> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let value = serde_json::from_str::<serde_json::Value>(&json_str)
        .with_context(|| format!("oracle output is not valid JSON: {json_str}"))?;
    LlmQueryReply::from_value(value)
}

#[cfg(test)]
pub fn parse_draft(text: &str) -> anyhow::Result<crate::domain::query::QueryDraft> {
    parse_reply(text)?.validate_and_into_draft()
}
