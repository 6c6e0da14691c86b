use crate::domain::{AgentStatus, TransitionError};
use crate::infrastructure::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent '{id}' not found")]
    NotFound { id: String },
    #[error("cannot {operation} agent '{id}' while it is {status}")]
    InvalidState {
        id: String,
        status: AgentStatus,
        operation: &'static str,
    },
    #[error("agent '{id}' has no contract")]
    EmptyContract { id: String },
    #[error(transparent)]
    Inference(#[from] ModelError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("failed to compress payload: {0}")]
    Payload(#[from] std::io::Error),
}

impl AgentError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn invalid_state(id: impl Into<String>, status: AgentStatus, operation: &'static str) -> Self {
        Self::InvalidState {
            id: id.into(),
            status,
            operation,
        }
    }
}
