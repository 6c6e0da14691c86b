use crate::agent::AgentSummary;
use crate::tooling::{ServerStatus, ToolDefinition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub agents: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolInventoryResponse {
    pub servers: Vec<ServerStatus>,
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentListResponse {
    pub agents: Vec<AgentSummary>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContractRequest {
    pub contract: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: String,
}
