use super::conversation::Conversation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle of one agent run: `Ready -> Running -> {Completed, Stopped}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Ready,
    Running,
    Stopped,
    Completed,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Ready => "ready",
            AgentStatus::Running => "running",
            AgentStatus::Stopped => "stopped",
            AgentStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Stopped | AgentStatus::Completed)
    }

    /// Forward edges only; returning to `Ready` goes through [`Agent::reset`].
    pub fn can_transition_to(self, next: AgentStatus) -> bool {
        matches!(
            (self, next),
            (AgentStatus::Ready, AgentStatus::Running)
                | (AgentStatus::Running, AgentStatus::Completed)
                | (AgentStatus::Running, AgentStatus::Stopped)
        )
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status transition from {from} to {to}")]
pub struct TransitionError {
    pub from: AgentStatus,
    pub to: AgentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Assistant,
    ToolCall,
    ToolResult,
    Error,
    System,
}

impl OutputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputKind::Assistant => "assistant",
            OutputKind::ToolCall => "tool_call",
            OutputKind::ToolResult => "tool_result",
            OutputKind::Error => "error",
            OutputKind::System => "system",
        }
    }
}

/// Immutable record of something an agent produced during a run.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AgentOutput {
    pub kind: OutputKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Work product attached on completion, stored gzip-compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub compressed: Vec<u8>,
    pub original_size: usize,
}

#[derive(Debug, Clone)]
pub struct Agent {
    id: String,
    pub contract: String,
    status: AgentStatus,
    pub conversation: Option<Conversation>,
    output: Vec<AgentOutput>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    summary: Option<String>,
    payload: Option<Payload>,
}

impl Agent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            contract: String::new(),
            status: AgentStatus::Ready,
            conversation: None,
            output: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            stopped_at: None,
            summary: None,
            payload: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn output(&self) -> &[AgentOutput] {
        &self.output
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn stopped_at(&self) -> Option<DateTime<Utc>> {
        self.stopped_at
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Move to `next`, stamping the matching timestamp once.
    ///
    /// Returns `Ok(false)` when the agent is already in `next`.
    pub fn transition(&mut self, next: AgentStatus) -> Result<bool, TransitionError> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        let now = Utc::now();
        match next {
            AgentStatus::Running => {
                self.started_at.get_or_insert(now);
            }
            AgentStatus::Completed => {
                self.completed_at.get_or_insert(now);
            }
            AgentStatus::Stopped => {
                self.stopped_at.get_or_insert(now);
            }
            AgentStatus::Ready => {}
        }
        self.status = next;
        Ok(true)
    }

    pub fn add_output(
        &mut self,
        kind: OutputKind,
        content: impl Into<String>,
        tool_call: Option<String>,
    ) -> &AgentOutput {
        self.output.push(AgentOutput {
            kind,
            content: content.into(),
            tool_call,
            created_at: Utc::now(),
        });
        &self.output[self.output.len() - 1]
    }

    /// Record completion details. The caller has already moved the agent to `Completed`.
    pub fn record_completion(&mut self, summary: impl Into<String>, payload: Option<Payload>) {
        self.summary = Some(summary.into());
        self.payload = payload;
    }

    /// Return to the initial state for a fresh run. Identity, contract and creation time survive.
    pub fn reset(&mut self) {
        self.status = AgentStatus::Ready;
        self.conversation = None;
        self.output.clear();
        self.started_at = None;
        self.completed_at = None;
        self.stopped_at = None;
        self.summary = None;
        self.payload = None;
    }
}
