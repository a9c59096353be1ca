use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiMessage {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content: String,
}

impl UiMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: "text",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiChart {
    pub chart_type: ChartKind,
    pub title: String,
    pub data: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiFormField {
    pub name: String,
    pub label: String,
    pub value: Value,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiForm {
    pub form_id: String,
    pub title: String,
    pub fields: Vec<UiFormField>,
    pub actions: Vec<UiAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UiComponent {
    Table(UiTable),
    Chart(UiChart),
    Form(UiForm),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UiPayload {
    pub messages: Vec<UiMessage>,
    pub components: Vec<UiComponent>,
}

impl UiPayload {
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            messages: vec![UiMessage::text(content)],
            components: Vec::new(),
        }
    }

    pub fn with_component(mut self, component: UiComponent) -> Self {
        self.components.push(component);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn components_are_tagged_by_type() {
        let payload = UiPayload::message("hi").with_component(UiComponent::Chart(UiChart {
            chart_type: ChartKind::Pie,
            title: "Top 1 categories".to_string(),
            data: vec![json!({"category": "Food", "total": 10.5})
                .as_object()
                .cloned()
                .unwrap()],
        }));

        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["messages"][0], json!({"type": "text", "content": "hi"}));
        assert_eq!(v["components"][0]["type"], "chart");
        assert_eq!(v["components"][0]["chartType"], "pie");
    }
}
