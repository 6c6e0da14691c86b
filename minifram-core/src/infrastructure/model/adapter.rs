//! Message adapters - convert conversation projections to the OpenAI wire format

use crate::application::tooling::ToolDefinition;
use crate::domain::{BackendMessage, MessageRole, ToolCallRequest};
use serde_json::{Value, json};

pub struct MessageAdapter;

impl MessageAdapter {
    /// `[{"role": "...", "content": "..."}]`, with assistant `tool_calls`
    /// rebuilt from the annotation and `tool_call_id` on tool results.
    pub fn to_openai_format(messages: &[BackendMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|message| match message {
                BackendMessage::Chat {
                    role,
                    content,
                    tool_call_data,
                } => {
                    let mut entry = json!({
                        "role": role.as_str(),
                        "content": content,
                    });
                    if *role == MessageRole::Assistant {
                        if let Some(calls) = tool_call_data.as_deref().and_then(Self::decode_calls)
                        {
                            entry["tool_calls"] = Value::Array(calls);
                        }
                    }
                    entry
                }
                BackendMessage::ToolResult {
                    content,
                    tool_call_id,
                } => {
                    let mut entry = json!({
                        "role": "tool",
                        "content": content,
                    });
                    if let Some(id) = tool_call_id {
                        entry["tool_call_id"] = Value::String(id.clone());
                    }
                    entry
                }
            })
            .collect()
    }

    /// `[{"type": "function", "function": {name, description, parameters}}]`
    pub fn tools_to_openai(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema,
                    }
                })
            })
            .collect()
    }

    fn decode_calls(annotation: &str) -> Option<Vec<Value>> {
        let calls: Vec<ToolCallRequest> = serde_json::from_str(annotation).ok()?;
        if calls.is_empty() {
            return None;
        }
        Some(
            calls
                .into_iter()
                .map(|call| {
                    let arguments = match call.arguments {
                        Value::String(text) => text,
                        Value::Null => "{}".to_string(),
                        other => other.to_string(),
                    };
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": arguments,
                        }
                    })
                })
                .collect(),
        )
    }
}
