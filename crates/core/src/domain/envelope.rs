use crate::domain::query::QuerySpec;
use crate::domain::ui::UiPayload;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    /// Row the user picked in a previously returned transactions table.
    #[serde(default)]
    pub selected_transaction_id: Option<String>,
}

impl ConversationContext {
    pub fn selected(&self) -> Option<&str> {
        self.selected_transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub account_id: String,
    pub message: String,
    #[serde(default)]
    pub context: Option<ConversationContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub query: QuerySpec,
    pub ui: UiPayload,
}
