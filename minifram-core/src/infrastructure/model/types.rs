//! Model types - Request, Response, and Error types

use crate::application::tooling::ToolDefinition;
use crate::domain::{BackendMessage, ToolCallRequest};
use reqwest::StatusCode;
use thiserror::Error;

/// One inference turn request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<BackendMessage>,
    /// Empty when tools are not offered for this turn.
    pub tools: Vec<ToolDefinition>,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, messages: Vec<BackendMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn without_tools(&self) -> Self {
        Self {
            model: self.model.clone(),
            messages: self.messages.clone(),
            tools: Vec::new(),
        }
    }
}

/// Generated content and/or requested tool invocations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
    /// Set when the tool catalog was rejected and the turn was retried without it.
    pub tools_unsupported: bool,
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCallRequest>) -> Self {
        self.tool_calls = tool_calls;
        self
    }
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' requires an API key (set {env_var})")]
    MissingApiKey { provider: String, env_var: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' rejected the tool catalog (HTTP {status})")]
    ToolsRejected {
        provider: String,
        status: StatusCode,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
            env_var: env_var.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn is_tools_rejected(&self) -> bool {
        matches!(self, ModelError::ToolsRejected { .. })
    }
}
