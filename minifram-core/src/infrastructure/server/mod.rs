//! HTTP transport: REST lifecycle endpoints, the per-agent WebSocket and the
//! JSON-RPC surface, all backed by one [`AgentService`].

mod docs;
mod dto;
mod error;
mod router;
mod routes;
mod state;

pub use dto::{
    AgentListResponse, ContractRequest, DeletedResponse, ErrorResponse, HealthResponse,
    ToolInventoryResponse,
};
pub use error::ServerError;
pub(crate) use state::ServerState;

use crate::agent::AgentService;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;

/// Build the application router without binding it.
pub fn app(service: AgentService) -> Router {
    router::build_router(service)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(service: AgentService, addr: SocketAddr, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    router::serve(service, addr, shutdown).await
}
