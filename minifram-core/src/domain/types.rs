use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(MessageRole::System),
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            "tool" => Some(MessageRole::Tool),
            _ => None,
        }
    }
}

/// One entry of a conversation.
///
/// `tool_calls` holds the serialized tool invocations requested by an
/// assistant turn; `tool_call_id` links a tool result back to one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_tool_calls(mut self, annotation: impl Into<String>) -> Self {
        self.tool_calls = Some(annotation.into());
        self
    }

    pub fn with_tool_call_id(mut self, id: impl Into<String>) -> Self {
        self.tool_call_id = Some(id.into());
        self
    }
}

/// A tool invocation requested by the inference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Either a JSON object or a string holding encoded JSON, depending on backend.
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Decode the arguments into a keyword map.
    ///
    /// Null and blank strings decode to an empty map.
    pub fn keyword_arguments(&self) -> Result<JsonMap<String, Value>, String> {
        match &self.arguments {
            Value::Object(map) => Ok(map.clone()),
            Value::Null => Ok(JsonMap::new()),
            Value::String(raw) if raw.trim().is_empty() => Ok(JsonMap::new()),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(Value::Null) => Ok(JsonMap::new()),
                Ok(other) => Err(format!("expected a JSON object, got {other}")),
                Err(err) => Err(format!("arguments are not valid JSON: {err}")),
            },
            other => Err(format!("expected a JSON object, got {other}")),
        }
    }
}
