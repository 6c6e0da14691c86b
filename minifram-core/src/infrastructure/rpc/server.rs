use crate::agent::{AgentError, AgentService};
use crate::rpc::types::{AGENT_ERROR, RpcRequest, RpcResponse};
use crate::server::ServerState;
use axum::Json;
use axum::extract::State;
use serde_json::{Map as JsonMap, Value, json};
use std::sync::Arc;
use tracing::{debug, error, info};

pub(crate) async fn handle_rpc(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    debug!(method = %request.method, "Received JSON-RPC request");

    if request.jsonrpc != "2.0" {
        return Json(RpcResponse::invalid_request(
            "Unsupported jsonrpc version (expected 2.0)",
        ));
    }

    let service = state.service();
    let id = request.id.clone();
    let response = match request.method.as_str() {
        "agent_start" => handle_agent_start(service, &request).await,
        "agent_status" => handle_agent_status(service, &request).await,
        "agent_stop" => handle_agent_stop(service, &request).await,
        "agent_complete" => handle_agent_complete(service, &request).await,
        other => {
            error!(method = other, "Unknown JSON-RPC method");
            Err(RpcResponse::method_not_found(id.clone(), other))
        }
    };

    Json(response.unwrap_or_else(|failure| failure))
}

type RpcOutcome = Result<RpcResponse, RpcResponse>;

async fn handle_agent_start(service: &AgentService, request: &RpcRequest) -> RpcOutcome {
    let params = object_params(request)?;
    let contract = required_str(request, params, "contract")?;
    if contract.trim().is_empty() {
        return Err(RpcResponse::invalid_params(
            request.id.clone(),
            "params.contract must be a non-empty string",
        ));
    }
    let report = service
        .launch(contract)
        .await
        .map_err(|err| agent_failure(request, err))?;
    info!(agent_id = %report.agent_id, "Agent started via JSON-RPC");
    Ok(success(request, &report))
}

async fn handle_agent_status(service: &AgentService, request: &RpcRequest) -> RpcOutcome {
    let params = object_params(request)?;
    let Some(Value::Array(ids)) = params.get("agent_ids") else {
        return Err(RpcResponse::invalid_params(
            request.id.clone(),
            "params.agent_ids must be an array of agent ids",
        ));
    };

    let mut statuses = Vec::with_capacity(ids.len());
    for value in ids {
        let Some(agent_id) = value.as_str() else {
            statuses.push(json!({"agent_id": value, "error": "agent id must be a string"}));
            continue;
        };
        match service.report(agent_id).await {
            Ok(report) => statuses.push(serde_json::to_value(report).unwrap_or(Value::Null)),
            Err(err) => statuses.push(json!({"agent_id": agent_id, "error": err.to_string()})),
        }
    }
    Ok(RpcResponse::success(request.id.clone(), Value::Array(statuses)))
}

async fn handle_agent_stop(service: &AgentService, request: &RpcRequest) -> RpcOutcome {
    let params = object_params(request)?;
    let agent_id = required_str(request, params, "agent_id")?;
    let report = service
        .stop(agent_id)
        .await
        .map_err(|err| agent_failure(request, err))?;
    Ok(success(request, &report))
}

async fn handle_agent_complete(service: &AgentService, request: &RpcRequest) -> RpcOutcome {
    let params = object_params(request)?;
    let agent_id = required_str(request, params, "agent_id")?;
    let summary = required_str(request, params, "summary")?;
    let payload = match params.get("payload") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
    };
    let report = service
        .complete(agent_id, summary, payload.as_deref())
        .await
        .map_err(|err| agent_failure(request, err))?;
    info!(agent_id, "Agent completed via JSON-RPC");
    Ok(success(request, &report))
}

fn object_params(request: &RpcRequest) -> Result<&JsonMap<String, Value>, RpcResponse> {
    match &request.params {
        Some(Value::Object(params)) => Ok(params),
        _ => Err(RpcResponse::invalid_params(
            request.id.clone(),
            "params must be an object",
        )),
    }
}

fn required_str<'a>(
    request: &RpcRequest,
    params: &'a JsonMap<String, Value>,
    key: &str,
) -> Result<&'a str, RpcResponse> {
    params.get(key).and_then(Value::as_str).ok_or_else(|| {
        RpcResponse::invalid_params(request.id.clone(), format!("params.{key} must be a string"))
    })
}

fn success<T: serde::Serialize>(request: &RpcRequest, result: &T) -> RpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => RpcResponse::success(request.id.clone(), value),
        Err(err) => RpcResponse::error(request.id.clone(), AGENT_ERROR, err.to_string()),
    }
}

fn agent_failure(request: &RpcRequest, err: AgentError) -> RpcResponse {
    debug!(method = %request.method, %err, "JSON-RPC call rejected");
    RpcResponse::error(request.id.clone(), AGENT_ERROR, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentRunner, AgentStore, NoopTranscriptSink, RunnerSettings};
    use crate::domain::AgentStatus;
    use crate::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
    use crate::rpc::types::{INVALID_PARAMS, METHOD_NOT_FOUND};
    use crate::tooling::ToolRouter;
    use async_trait::async_trait;
    use std::time::Duration;

    struct IdleProvider;

    #[async_trait]
    impl ModelProvider for IdleProvider {
        async fn chat(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(ModelResponse::text("working on it"))
        }
    }

    fn state() -> Arc<ServerState> {
        let store = Arc::new(AgentStore::new());
        let runner = Arc::new(AgentRunner::new(
            Arc::new(IdleProvider),
            Arc::new(ToolRouter::new()),
            Arc::new(NoopTranscriptSink),
            RunnerSettings {
                model: "idle".into(),
                completion_tool: None,
            },
        ));
        Arc::new(ServerState::new(AgentService::new(
            store,
            runner,
            "http://localhost:8101",
        )))
    }

    fn request(method: &str, params: Value) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params: Some(params),
            id: Some(json!(7)),
        }
    }

    async fn call(state: &Arc<ServerState>, method: &str, params: Value) -> RpcResponse {
        let Json(response) = handle_rpc(State(state.clone()), Json(request(method, params))).await;
        response
    }

    async fn wait_for(state: &Arc<ServerState>, id: &str, status: AgentStatus) {
        for _ in 0..200 {
            if state.service().report(id).await.expect("report").status == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("agent {id} never reached {status}");
    }

    #[tokio::test]
    async fn start_complete_and_query_status() {
        let state = state();
        let started = call(&state, "agent_start", json!({"contract": "count to ten"})).await;
        let result = started.result.expect("result");
        assert_eq!(result["agent_id"], "agent-1");
        assert_eq!(result["status"], "running");
        assert_eq!(started.id, Some(json!(7)));

        let completed = call(
            &state,
            "agent_complete",
            json!({"agent_id": "agent-1", "summary": "counted", "payload": "1..10"}),
        )
        .await;
        let result = completed.result.expect("result");
        assert_eq!(result["status"], "completed");
        assert_eq!(result["summary"], "counted");
        assert_eq!(
            result["payload_url"],
            "http://localhost:8101/api/agents/agent-1/payload"
        );

        wait_for(&state, "agent-1", AgentStatus::Completed).await;
        let statuses = call(&state, "agent_status", json!({"agent_ids": ["agent-1", "agent-9"]})).await;
        let result = statuses.result.expect("result");
        assert_eq!(result[0]["status"], "completed");
        assert_eq!(result[1]["agent_id"], "agent-9");
        assert!(result[1]["error"].as_str().expect("error").contains("not found"));
    }

    #[tokio::test]
    async fn stop_settles_running_agent() {
        let state = state();
        call(&state, "agent_start", json!({"contract": "loop"})).await;
        let stopped = call(&state, "agent_stop", json!({"agent_id": "agent-1"})).await;
        assert!(stopped.error.is_none());
        wait_for(&state, "agent-1", AgentStatus::Stopped).await;

        let again = call(&state, "agent_stop", json!({"agent_id": "agent-1"})).await;
        assert_eq!(again.result.expect("result")["status"], "stopped");
    }

    #[tokio::test]
    async fn rejects_bad_params_and_unknown_methods() {
        let state = state();
        let response = call(&state, "agent_start", json!({"contract": "  "})).await;
        assert_eq!(response.error.expect("error").code, INVALID_PARAMS);

        let response = call(&state, "agent_stop", json!({})).await;
        assert_eq!(response.error.expect("error").code, INVALID_PARAMS);

        let response = call(&state, "agent_stop", json!({"agent_id": "agent-404"})).await;
        assert_eq!(response.error.expect("error").code, AGENT_ERROR);

        let response = call(&state, "agent_dance", json!({})).await;
        assert_eq!(response.error.expect("error").code, METHOD_NOT_FOUND);

        let mut bad = request("agent_start", json!({}));
        bad.jsonrpc = "1.0".into();
        let Json(response) = handle_rpc(State(state.clone()), Json(bad)).await;
        assert!(response.error.is_some());
        assert!(response.id.is_none());
    }
}
