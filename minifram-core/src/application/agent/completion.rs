use super::errors::AgentError;
use super::report::AgentStatusReport;
use super::store::{AgentHandle, AgentStore};
use crate::application::tooling::{HandlerError, HandlerResult, InternalTool, ToolOutput};
use crate::domain::{AgentStatus, Payload};
use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::{Map as JsonMap, Value, json};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

pub const COMPLETION_TOOL_DESCRIPTION: &str = "Signal that the agent has completed its contract. Call this when the objective is fulfilled.";

pub fn completion_tool_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "agent_id": {"type": "string", "description": "The agent's ID"},
            "summary": {"type": "string", "description": "Brief summary of what was accomplished"},
            "payload": {"type": "string", "description": "Optional detailed work product data"}
        },
        "required": ["agent_id", "summary"]
    })
}

/// Gzip `data`, remembering its original byte length.
pub fn compress_payload(data: &str) -> Result<Payload, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data.as_bytes())?;
    Ok(Payload {
        compressed: encoder.finish()?,
        original_size: data.len(),
    })
}

/// Mark a running agent completed. Returns `Ok(false)` when it already was;
/// the first recorded summary and payload are kept.
pub async fn complete_agent(
    agent: &AgentHandle,
    summary: &str,
    payload: Option<&str>,
) -> Result<bool, AgentError> {
    let mut state = agent.lock().await;
    match state.status() {
        AgentStatus::Completed => return Ok(false),
        AgentStatus::Running => {}
        other => return Err(AgentError::invalid_state(agent.id(), other, "complete")),
    }
    let payload = payload
        .filter(|data| !data.is_empty())
        .map(compress_payload)
        .transpose()?;
    state.transition(AgentStatus::Completed)?;
    state.record_completion(summary, payload);
    info!(agent_id = %agent.id(), "agent completed via completion tool");
    Ok(true)
}

/// In-process tool the model calls to finish its contract.
pub struct CompletionTool {
    store: Arc<AgentStore>,
    public_url: String,
}

impl CompletionTool {
    pub fn new(store: Arc<AgentStore>, public_url: impl Into<String>) -> Self {
        Self {
            store,
            public_url: public_url.into(),
        }
    }
}

#[async_trait]
impl InternalTool for CompletionTool {
    async fn call(&self, arguments: JsonMap<String, Value>) -> HandlerResult {
        let agent_id = required_str(&arguments, "agent_id")?;
        let summary = required_str(&arguments, "summary")?;
        let payload = match arguments.get("payload") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        };

        let agent = self
            .store
            .get(agent_id)
            .await
            .ok_or_else(|| HandlerError(format!("agent '{agent_id}' not found")))?;
        complete_agent(&agent, summary, payload.as_deref())
            .await
            .map_err(|err| HandlerError(err.to_string()))?;

        let report = AgentStatusReport::from_agent(&agent.snapshot().await, &self.public_url);
        serde_json::to_value(report)
            .map(ToolOutput::Structured)
            .map_err(|err| HandlerError(err.to_string()))
    }
}

fn required_str<'a>(arguments: &'a JsonMap<String, Value>, key: &str) -> Result<&'a str, HandlerError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError(format!("missing required string argument '{key}'")))
}
