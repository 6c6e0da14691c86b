// Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use minifram_core::agent::{
    AgentRunner, AgentService, AgentStore, COMPLETION_TOOL_DESCRIPTION, CompletionTool,
    NoopTranscriptSink, RunnerSettings, TranscriptSink, completion_tool_schema,
};
use minifram_core::domain::{AgentStatus, ToolCallRequest};
use minifram_core::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
use minifram_core::tooling::ToolRouter;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PUBLIC_URL: &str = "http://localhost:8101";

/// Replays canned responses and records every request. Once the script runs
/// out it keeps answering "still working".
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    responses: Arc<Mutex<VecDeque<ModelResponse>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().expect("requests lock").push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().expect("responses lock").pop_front();
        Ok(next.unwrap_or_else(|| ModelResponse::text("still working")))
    }
}

pub fn text(content: &str) -> ModelResponse {
    ModelResponse::text(content)
}

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ModelResponse {
    ModelResponse::text("").with_tool_calls(vec![ToolCallRequest::new(id, name, arguments)])
}

pub struct Harness {
    pub service: AgentService,
    pub store: Arc<AgentStore>,
    pub tools: Arc<ToolRouter>,
}

pub async fn harness(provider: ScriptedProvider, tools: ToolRouter) -> Harness {
    harness_with_sink(provider, tools, Arc::new(NoopTranscriptSink)).await
}

pub async fn harness_with_sink(
    provider: ScriptedProvider,
    tools: ToolRouter,
    transcripts: Arc<dyn TranscriptSink>,
) -> Harness {
    let store = Arc::new(AgentStore::new());
    tools
        .register_internal(
            "agent_complete",
            COMPLETION_TOOL_DESCRIPTION,
            completion_tool_schema(),
            CompletionTool::new(store.clone(), PUBLIC_URL),
        )
        .await
        .expect("register completion tool");
    let tools = Arc::new(tools);
    let runner = Arc::new(AgentRunner::new(
        Arc::new(provider),
        tools.clone(),
        transcripts,
        RunnerSettings {
            model: "scripted".into(),
            completion_tool: Some("agent_complete".into()),
        },
    ));
    Harness {
        service: AgentService::new(store.clone(), runner, PUBLIC_URL),
        store,
        tools,
    }
}

/// Poll until the agent reaches `status`.
pub async fn wait_for_status(service: &AgentService, id: &str, status: AgentStatus) {
    for _ in 0..400 {
        let report = service.report(id).await.expect("agent exists");
        if report.status == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("agent {id} never reached {status}");
}
