use super::super::dto::HealthResponse;
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.model().to_string(),
        agents: state.service().store().len().await,
    })
}
