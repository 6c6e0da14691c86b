use thiserror::Error;

/// Failures talking to one external tool process.
#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("failed to launch tool server '{server}': {source}")]
    Launch {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server '{server}' is not running")]
    NotRunning { server: String },
    #[error("tool server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("tool server '{server}' sent a malformed response: {message}")]
    Protocol { server: String, message: String },
    #[error("tool server '{server}' returned error {code}: {message}")]
    Remote {
        server: String,
        code: i64,
        message: String,
    },
}

impl ToolInvokeError {
    pub fn server(&self) -> &str {
        match self {
            ToolInvokeError::Launch { server, .. }
            | ToolInvokeError::NotRunning { server }
            | ToolInvokeError::Transport { server, .. }
            | ToolInvokeError::Protocol { server, .. }
            | ToolInvokeError::Remote { server, .. } => server,
        }
    }
}

/// Error raised by an in-process tool handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl From<String> for HandlerError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HandlerError {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Failures resolving or executing a tool through the router.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool '{name}' not found. Available tools: [{}]", .available.join(", "))]
    NotFound {
        name: String,
        available: Vec<String>,
    },
    #[error("tool '{name}' is already registered by {owner}")]
    Conflict { name: String, owner: String },
    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("{message}")]
    Handler { tool: String, message: String },
    #[error("{message}")]
    Failed { tool: String, message: String },
    #[error(transparent)]
    Invoke(#[from] ToolInvokeError),
}
