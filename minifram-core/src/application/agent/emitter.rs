use super::store::AgentHandle;
use crate::domain::{AgentStatus, OutputKind, TransitionError};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Init,
    Status,
    Assistant,
    ToolCall,
    ToolResult,
    Error,
    System,
}

impl From<OutputKind> for EventKind {
    fn from(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Assistant => EventKind::Assistant,
            OutputKind::ToolCall => EventKind::ToolCall,
            OutputKind::ToolResult => EventKind::ToolResult,
            OutputKind::Error => EventKind::Error,
            OutputKind::System => EventKind::System,
        }
    }
}

/// Message pushed to a live observer: `{"type", "content", "tool_call"}`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AgentEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub content: String,
    pub tool_call: Option<String>,
}

impl AgentEvent {
    pub fn new(kind: EventKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            tool_call: None,
        }
    }

    pub fn status(status: AgentStatus) -> Self {
        Self::new(EventKind::Status, status.as_str())
    }
}

/// Where agent output goes besides the agent's own transcript.
#[derive(Debug, Clone)]
pub enum OutputEmitter {
    /// Record and push every event to an attached observer.
    Live(mpsc::Sender<AgentEvent>),
    /// Record only.
    Recording,
}

impl OutputEmitter {
    pub fn live(sender: mpsc::Sender<AgentEvent>) -> Self {
        OutputEmitter::Live(sender)
    }

    pub fn is_live(&self) -> bool {
        matches!(self, OutputEmitter::Live(_))
    }

    pub async fn emit_output(
        &self,
        agent: &AgentHandle,
        kind: OutputKind,
        content: impl Into<String>,
        tool_call: Option<String>,
    ) {
        let content = content.into();
        agent
            .lock()
            .await
            .add_output(kind, content.clone(), tool_call.clone());
        self.push(
            agent,
            AgentEvent {
                kind: kind.into(),
                content,
                tool_call,
            },
        )
        .await;
    }

    /// Apply a status transition and announce it.
    ///
    /// Settling an already-terminal agent into another terminal status is a
    /// no-op and returns `Ok(false)`.
    pub async fn emit_status(
        &self,
        agent: &AgentHandle,
        next: AgentStatus,
    ) -> Result<bool, TransitionError> {
        let changed = {
            let mut state = agent.lock().await;
            if state.status().is_terminal() && next.is_terminal() {
                false
            } else {
                state.transition(next)?
            }
        };
        if changed {
            debug!(agent_id = %agent.id(), status = %next, "agent status changed");
            self.announce_status(agent, next).await;
        }
        Ok(changed)
    }

    /// Push a status event without touching the agent.
    pub async fn announce_status(&self, agent: &AgentHandle, status: AgentStatus) {
        self.push(agent, AgentEvent::status(status)).await;
    }

    async fn push(&self, agent: &AgentHandle, event: AgentEvent) {
        match self {
            OutputEmitter::Live(sender) => {
                if sender.send(event).await.is_err() {
                    debug!(agent_id = %agent.id(), "observer detached; event dropped");
                }
            }
            OutputEmitter::Recording => {}
        }
    }
}
