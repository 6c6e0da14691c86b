use super::super::dto::ToolInventoryResponse;
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;
use tracing::debug;

#[utoipa::path(
    get,
    path = "/api/tools",
    tag = "tools",
    responses(
        (status = 200, description = "Tool servers and the routed tool catalog", body = ToolInventoryResponse)
    )
)]
pub async fn tools_handler(State(state): State<Arc<ServerState>>) -> Json<ToolInventoryResponse> {
    let router = state.tools();
    let servers = router.server_status().await;
    let tools = router.all_tools().await;
    debug!(
        tool_count = tools.len(),
        server_count = servers.len(),
        "Serving /api/tools request"
    );
    Json(ToolInventoryResponse { servers, tools })
}
