use super::error::HandlerError;
use async_trait::async_trait;
use serde::{Serialize, Serializer};
use serde_json::{Map as JsonMap, Value};
use std::future::Future;
use utoipa::ToSchema;

/// Label used for tools served in-process.
pub const INTERNAL_ORIGIN: &str = "_internal";

/// Which backend serves a tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolOrigin {
    Internal,
    External(String),
}

impl ToolOrigin {
    pub fn label(&self) -> &str {
        match self {
            ToolOrigin::Internal => INTERNAL_ORIGIN,
            ToolOrigin::External(server) => server,
        }
    }
}

impl Serialize for ToolOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub input_schema: Value,
    #[schema(value_type = String)]
    pub origin: ToolOrigin,
}

/// Result of an in-process tool handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Structured(Value),
}

impl ToolOutput {
    pub fn into_text(self) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::Structured(Value::String(text)) => text,
            ToolOutput::Structured(value) => value.to_string(),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(value: String) -> Self {
        ToolOutput::Text(value)
    }
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        ToolOutput::Structured(value)
    }
}

pub type HandlerResult = Result<ToolOutput, HandlerError>;

/// A tool executed inside this process.
#[async_trait]
pub trait InternalTool: Send + Sync {
    async fn call(&self, arguments: JsonMap<String, Value>) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> InternalTool for F
where
    F: Fn(JsonMap<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn call(&self, arguments: JsonMap<String, Value>) -> HandlerResult {
        (self)(arguments).await
    }
}

/// One block of a `tools/call` response.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    Other { kind: String, raw: Value },
}

impl ContentBlock {
    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        if kind.eq_ignore_ascii_case("text") {
            if let Some(text) = value.get("text").and_then(Value::as_str) {
                return ContentBlock::Text(text.to_string());
            }
        }
        ContentBlock::Other { kind, raw: value }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(text) => Some(text),
            ContentBlock::Other { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl ToolCallResult {
    /// Text blocks joined by newlines; other block kinds are skipped.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_only_text_blocks() {
        let result = ToolCallResult {
            content: vec![
                ContentBlock::from_value(json!({"type": "text", "text": "first"})),
                ContentBlock::from_value(json!({"type": "image", "data": "AAAA"})),
                ContentBlock::from_value(json!({"type": "text", "text": "second"})),
            ],
            is_error: false,
        };
        assert_eq!(result.joined_text(), "first\nsecond");
    }

    #[test]
    fn structured_output_serializes_to_json_text() {
        let output = ToolOutput::Structured(json!({"status": "completed"}));
        assert_eq!(output.into_text(), r#"{"status":"completed"}"#);
        let output = ToolOutput::Structured(json!("plain"));
        assert_eq!(output.into_text(), "plain");
    }

    #[test]
    fn origin_serializes_as_label() {
        let value = serde_json::to_value(ToolOrigin::External("hello".into())).expect("json");
        assert_eq!(value, json!("hello"));
        let value = serde_json::to_value(ToolOrigin::Internal).expect("json");
        assert_eq!(value, json!(INTERNAL_ORIGIN));
    }
}
