use super::dto::{
    AgentListResponse, ContractRequest, DeletedResponse, ErrorResponse, HealthResponse,
    ToolInventoryResponse,
};
use super::routes;
use crate::agent::{AgentEvent, AgentStatusReport, AgentSummary, AgentView, EventKind};
use crate::domain::{AgentOutput, AgentStatus, OutputKind};
use crate::tooling::{ServerHealth, ServerStatus, ToolDefinition};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_handler,
        routes::tools::tools_handler,
        routes::agents::create_agent_handler,
        routes::agents::list_agents_handler,
        routes::agents::get_agent_handler,
        routes::agents::set_contract_handler,
        routes::agents::start_agent_handler,
        routes::agents::stop_agent_handler,
        routes::agents::reset_agent_handler,
        routes::agents::delete_agent_handler,
        routes::agents::payload_handler
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            ToolInventoryResponse,
            AgentListResponse,
            ContractRequest,
            DeletedResponse,
            AgentStatusReport,
            AgentSummary,
            AgentView,
            AgentOutput,
            AgentStatus,
            OutputKind,
            AgentEvent,
            EventKind,
            ServerStatus,
            ServerHealth,
            ToolDefinition
        )
    ),
    tags(
        (name = "health", description = "Liveness and configured model"),
        (name = "tools", description = "Tool servers and the routed tool catalog"),
        (name = "agents", description = "Agent lifecycle: create, contract, start, stop, reset, payload")
    )
)]
pub(super) struct ApiDoc;
