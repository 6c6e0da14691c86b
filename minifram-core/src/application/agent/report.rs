use crate::application::tooling::truncate;
use crate::domain::{Agent, AgentOutput, AgentStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

const RECENT_OUTPUT_CHARS: usize = 200;

/// Compact lifecycle status of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AgentStatusReport {
    pub agent_id: String,
    pub status: AgentStatus,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_url: Option<String>,
    /// Latest output while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_output: Option<String>,
}

impl AgentStatusReport {
    pub fn from_agent(agent: &Agent, public_url: &str) -> Self {
        let status = agent.status();
        let completed = status == AgentStatus::Completed;
        let payload = agent.payload();
        Self {
            agent_id: agent.id().to_string(),
            status,
            started_at: agent.started_at(),
            completed_at: agent.completed_at().filter(|_| completed),
            summary: agent.summary().filter(|_| completed).map(str::to_string),
            stopped_at: agent
                .stopped_at()
                .filter(|_| status == AgentStatus::Stopped),
            payload_size: payload.map(|payload| payload.original_size),
            payload_url: payload.map(|_| payload_url(public_url, agent.id())),
            recent_output: if status == AgentStatus::Running {
                agent
                    .output()
                    .last()
                    .map(|entry| truncate(&entry.content, RECENT_OUTPUT_CHARS))
            } else {
                None
            },
        }
    }
}

pub fn payload_url(public_url: &str, agent_id: &str) -> String {
    format!(
        "{}/api/agents/{agent_id}/payload",
        public_url.trim_end_matches('/')
    )
}

/// Listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AgentSummary {
    pub id: String,
    pub status: AgentStatus,
    pub contract: String,
    pub created_at: DateTime<Utc>,
    pub output_count: usize,
}

impl From<&Agent> for AgentSummary {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id().to_string(),
            status: agent.status(),
            contract: agent.contract.clone(),
            created_at: agent.created_at(),
            output_count: agent.output().len(),
        }
    }
}

/// Full agent state including the output transcript.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AgentView {
    pub id: String,
    pub status: AgentStatus,
    pub contract: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub payload_size: Option<usize>,
    pub output: Vec<AgentOutput>,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id().to_string(),
            status: agent.status(),
            contract: agent.contract.clone(),
            created_at: agent.created_at(),
            started_at: agent.started_at(),
            completed_at: agent.completed_at(),
            stopped_at: agent.stopped_at(),
            summary: agent.summary().map(str::to_string),
            payload_size: agent.payload().map(|payload| payload.original_size),
            output: agent.output().to_vec(),
        }
    }
}
