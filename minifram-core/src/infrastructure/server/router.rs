use super::docs::ApiDoc;
use super::error::ServerError;
use super::routes;
use super::state::ServerState;
use crate::agent::AgentService;
use crate::rpc::server::handle_rpc;
use axum::Router;
use axum::http::Method;
use axum::routing::{get, post, put};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub(super) fn build_router(service: AgentService) -> Router {
    let api = ApiDoc::openapi();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let state = Arc::new(ServerState::new(service));
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", api))
        .route("/api/health", get(routes::health::health_handler))
        .route("/api/tools", get(routes::tools::tools_handler))
        .route(
            "/api/agents",
            get(routes::agents::list_agents_handler).post(routes::agents::create_agent_handler),
        )
        .route(
            "/api/agents/{id}",
            get(routes::agents::get_agent_handler).delete(routes::agents::delete_agent_handler),
        )
        .route(
            "/api/agents/{id}/contract",
            put(routes::agents::set_contract_handler),
        )
        .route("/api/agents/{id}/start", post(routes::agents::start_agent_handler))
        .route("/api/agents/{id}/stop", post(routes::agents::stop_agent_handler))
        .route("/api/agents/{id}/reset", post(routes::agents::reset_agent_handler))
        .route("/api/agents/{id}/payload", get(routes::agents::payload_handler))
        .route("/ws/agent/{id}", get(routes::ws::agent_socket_handler))
        .route("/rpc", post(handle_rpc))
        .layer(cors)
        .with_state(state)
}

pub(super) async fn serve<F>(
    service: AgentService,
    addr: SocketAddr,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(%addr, "Binding HTTP server");
    let app = build_router(service);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "HTTP server ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}
