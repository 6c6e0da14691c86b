use super::display;
use super::error::ToolError;
use super::interface::{InternalTool, ToolDefinition, ToolOrigin};
use super::process::McpProcess;
use crate::config::ServerConfig;
use crate::domain::ToolCallRequest;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use utoipa::ToSchema;

/// Backend a routed tool name resolves to.
#[derive(Clone)]
enum Route {
    Internal(Arc<dyn InternalTool>),
    External(McpProcess),
}

#[derive(Default)]
struct RouterState {
    catalog: Vec<ToolDefinition>,
    index: HashMap<String, Route>,
    servers: Vec<McpProcess>,
}

impl RouterState {
    fn owner_of(&self, name: &str) -> Option<ToolOrigin> {
        self.catalog
            .iter()
            .find(|tool| tool.name == name)
            .map(|tool| tool.origin.clone())
    }
}

/// A tool name advertised by more than one backend. The first owner keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConflict {
    pub tool: String,
    pub kept: ToolOrigin,
    pub rejected: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedServer {
    pub name: String,
    pub error: String,
}

/// Outcome of [`ToolRouter::load_external`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub started: Vec<String>,
    pub failed: Vec<FailedServer>,
    pub conflicts: Vec<ToolConflict>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServerHealth {
    Active,
    Broken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ServerStatus {
    pub name: String,
    pub status: ServerHealth,
    pub tools: usize,
}

/// One namespace over in-process tools and every external tool server.
#[derive(Default)]
pub struct ToolRouter {
    state: RwLock<RouterState>,
}

impl ToolRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_internal<T>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: T,
    ) -> Result<(), ToolError>
    where
        T: InternalTool + 'static,
    {
        let name = name.into();
        let mut state = self.state.write().await;
        if let Some(owner) = state.owner_of(&name) {
            return Err(ToolError::Conflict {
                name,
                owner: owner.label().to_string(),
            });
        }
        state.catalog.push(ToolDefinition {
            name: name.clone(),
            description: description.into(),
            input_schema,
            origin: ToolOrigin::Internal,
        });
        state.index.insert(name.clone(), Route::Internal(Arc::new(handler)));
        debug!(tool = %name, "registered internal tool");
        Ok(())
    }

    /// Start every configured server and index its tools. A server that fails
    /// to start is skipped; the others still load.
    pub async fn load_external(&self, configs: &[ServerConfig]) -> LoadReport {
        let mut report = LoadReport::default();
        for config in configs {
            let process = McpProcess::new(config.clone());
            if let Err(err) = process.start().await {
                error!(server = %config.name, %err, "failed to start tool server; skipping");
                report.failed.push(FailedServer {
                    name: config.name.clone(),
                    error: err.to_string(),
                });
                continue;
            }

            let tools = process.tools().await;
            let mut state = self.state.write().await;
            for tool in tools {
                if let Some(kept) = state.owner_of(&tool.name) {
                    error!(
                        tool = %tool.name,
                        server = %config.name,
                        owner = %kept.label(),
                        "tool name already registered; ignoring duplicate"
                    );
                    report.conflicts.push(ToolConflict {
                        tool: tool.name,
                        kept,
                        rejected: config.name.clone(),
                    });
                    continue;
                }
                state
                    .index
                    .insert(tool.name.clone(), Route::External(process.clone()));
                state.catalog.push(tool);
            }
            state.servers.push(process);
            info!(server = %config.name, "tool server loaded");
            report.started.push(config.name.clone());
        }
        report
    }

    /// Every routed tool, in registration order.
    pub async fn all_tools(&self) -> Vec<ToolDefinition> {
        self.state.read().await.catalog.clone()
    }

    pub async fn tool_names(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .catalog
            .iter()
            .map(|tool| tool.name.clone())
            .collect()
    }

    /// Execute a backend tool-call request, decoding string-encoded arguments first.
    pub async fn call_request(&self, request: &ToolCallRequest) -> Result<String, ToolError> {
        let arguments =
            request
                .keyword_arguments()
                .map_err(|reason| ToolError::InvalidArguments {
                    tool: request.name.clone(),
                    reason,
                })?;
        self.call(&request.name, arguments).await
    }

    pub async fn call(
        &self,
        name: &str,
        arguments: JsonMap<String, Value>,
    ) -> Result<String, ToolError> {
        let route = self.state.read().await.index.get(name).cloned();
        let Some(route) = route else {
            return Err(ToolError::NotFound {
                name: name.to_string(),
                available: self.tool_names().await,
            });
        };

        match route {
            Route::Internal(handler) => {
                debug!(tool = %name, "dispatching internal tool");
                let output = handler
                    .call(arguments)
                    .await
                    .map_err(|err| ToolError::Handler {
                        tool: name.to_string(),
                        message: err.to_string(),
                    })?;
                Ok(output.into_text())
            }
            Route::External(process) => {
                debug!(tool = %name, server = %process.name(), "dispatching external tool");
                let result = process.call_tool(name, arguments).await?;
                let text = result.joined_text();
                if result.is_error {
                    return Err(ToolError::Failed {
                        tool: name.to_string(),
                        message: text,
                    });
                }
                Ok(text)
            }
        }
    }

    pub fn format_display(&self, name: &str, arguments: &JsonMap<String, Value>) -> String {
        display::format_display(name, arguments)
    }

    pub async fn server_status(&self) -> Vec<ServerStatus> {
        let (servers, catalog) = {
            let state = self.state.read().await;
            (state.servers.clone(), state.catalog.clone())
        };
        let mut statuses = Vec::with_capacity(servers.len());
        for process in servers {
            let tools = catalog
                .iter()
                .filter(|tool| tool.origin.label() == process.name())
                .count();
            let status = if process.is_active().await {
                ServerHealth::Active
            } else {
                ServerHealth::Broken
            };
            statuses.push(ServerStatus {
                name: process.name().to_string(),
                status,
                tools,
            });
        }
        statuses
    }

    /// Close every external server and forget its tools. Internal tools stay registered.
    pub async fn shutdown(&self) {
        let servers = {
            let mut state = self.state.write().await;
            state
                .index
                .retain(|_, route| matches!(route, Route::Internal(_)));
            state
                .catalog
                .retain(|tool| matches!(tool.origin, ToolOrigin::Internal));
            std::mem::take(&mut state.servers)
        };
        for process in servers {
            process.close().await;
            info!(server = %process.name(), "tool server closed");
        }
    }
}
