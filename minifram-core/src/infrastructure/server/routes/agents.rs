use super::super::dto::{AgentListResponse, ContractRequest, DeletedResponse, ErrorResponse};
use super::super::error::ApiError;
use super::super::state::ServerState;
use crate::agent::{AgentStatusReport, AgentView};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    post,
    path = "/api/agents",
    tag = "agents",
    responses(
        (status = 201, description = "Agent created in the ready state", body = AgentStatusReport)
    )
)]
pub async fn create_agent_handler(
    State(state): State<Arc<ServerState>>,
) -> (StatusCode, Json<AgentStatusReport>) {
    let report = state.service().create().await;
    info!(agent_id = %report.agent_id, "Agent created via REST");
    (StatusCode::CREATED, Json(report))
}

#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "agents",
    responses(
        (status = 200, description = "All agents in creation order", body = AgentListResponse)
    )
)]
pub async fn list_agents_handler(State(state): State<Arc<ServerState>>) -> Json<AgentListResponse> {
    Json(AgentListResponse {
        agents: state.service().list().await,
    })
}

#[utoipa::path(
    get,
    path = "/api/agents/{id}",
    tag = "agents",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Agent state with its output transcript", body = AgentView),
        (status = 404, description = "Unknown agent", body = ErrorResponse)
    )
)]
pub async fn get_agent_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentView>, ApiError> {
    Ok(Json(state.service().view(&id).await?))
}

#[utoipa::path(
    put,
    path = "/api/agents/{id}/contract",
    tag = "agents",
    params(("id" = String, Path, description = "Agent id")),
    request_body = ContractRequest,
    responses(
        (status = 200, description = "Contract replaced", body = AgentStatusReport),
        (status = 404, description = "Unknown agent", body = ErrorResponse),
        (status = 409, description = "Agent is not ready", body = ErrorResponse)
    )
)]
pub async fn set_contract_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(request): Json<ContractRequest>,
) -> Result<Json<AgentStatusReport>, ApiError> {
    let service = state.service();
    service.set_contract(&id, request.contract).await?;
    Ok(Json(service.report(&id).await?))
}

#[utoipa::path(
    post,
    path = "/api/agents/{id}/start",
    tag = "agents",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Run started in the background", body = AgentStatusReport),
        (status = 400, description = "Agent has no contract", body = ErrorResponse),
        (status = 404, description = "Unknown agent", body = ErrorResponse),
        (status = 409, description = "Agent is not ready", body = ErrorResponse)
    )
)]
pub async fn start_agent_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentStatusReport>, ApiError> {
    Ok(Json(state.service().start_headless(&id).await?))
}

#[utoipa::path(
    post,
    path = "/api/agents/{id}/stop",
    tag = "agents",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Stop requested", body = AgentStatusReport),
        (status = 404, description = "Unknown agent", body = ErrorResponse)
    )
)]
pub async fn stop_agent_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentStatusReport>, ApiError> {
    Ok(Json(state.service().stop(&id).await?))
}

#[utoipa::path(
    post,
    path = "/api/agents/{id}/reset",
    tag = "agents",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Agent is ready again", body = AgentStatusReport),
        (status = 404, description = "Unknown agent", body = ErrorResponse),
        (status = 409, description = "Agent is running", body = ErrorResponse)
    )
)]
pub async fn reset_agent_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentStatusReport>, ApiError> {
    Ok(Json(state.service().reset(&id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/agents/{id}",
    tag = "agents",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Agent removed", body = DeletedResponse),
        (status = 404, description = "Unknown agent", body = ErrorResponse)
    )
)]
pub async fn delete_agent_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state.service().delete(&id).await?;
    Ok(Json(DeletedResponse { deleted: id }))
}

#[utoipa::path(
    get,
    path = "/api/agents/{id}/payload",
    tag = "agents",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Gzip-compressed payload bytes (Content-Encoding: gzip)"),
        (status = 404, description = "Unknown agent or no payload", body = ErrorResponse)
    )
)]
pub async fn payload_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let payload = state
        .service()
        .payload(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("agent '{id}' has no payload")))?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CONTENT_ENCODING, "gzip"),
        ],
        payload.compressed,
    )
        .into_response())
}
