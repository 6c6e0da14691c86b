use super::emitter::OutputEmitter;
use super::errors::AgentError;
use super::instructions::{ContractSignal, contract_message, detect_marker, system_prompt};
use super::store::AgentHandle;
use super::transcript::TranscriptSink;
use crate::application::tooling::{DISPLAY_WIDTH, ToolDefinition, ToolRouter, truncate};
use crate::domain::{
    AgentStatus, Conversation, Message, MessageRole, OutputKind, ToolCallRequest,
};
use crate::infrastructure::model::{ModelProvider, ModelRequest, ModelResponse};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Longest tool result preview shown to observers.
pub const RESULT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub model: String,
    /// Name of the completion tool advertised in the system prompt, if any.
    pub completion_tool: Option<String>,
}

/// Drives one agent from `Ready` to a terminal status.
pub struct AgentRunner {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<ToolRouter>,
    transcripts: Arc<dyn TranscriptSink>,
    settings: RunnerSettings,
}

impl AgentRunner {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: Arc<ToolRouter>,
        transcripts: Arc<dyn TranscriptSink>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            provider,
            tools,
            transcripts,
            settings,
        }
    }

    pub fn tools(&self) -> &Arc<ToolRouter> {
        &self.tools
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Start and drive the run to its end.
    pub async fn run(
        &self,
        agent: &AgentHandle,
        emitter: &OutputEmitter,
    ) -> Result<AgentStatus, AgentError> {
        self.begin(agent, emitter).await?;
        Ok(self.drive(agent, emitter).await)
    }

    /// Validate the agent, seed its conversation and move it to `Running`.
    pub async fn begin(&self, agent: &AgentHandle, emitter: &OutputEmitter) -> Result<(), AgentError> {
        {
            let mut state = agent.lock().await;
            if state.status() != AgentStatus::Ready {
                return Err(AgentError::invalid_state(agent.id(), state.status(), "start"));
            }
            if state.contract.trim().is_empty() {
                return Err(AgentError::EmptyContract {
                    id: agent.id().to_string(),
                });
            }
            let mut conversation = Conversation::new(agent.id());
            conversation.append(
                MessageRole::System,
                system_prompt(agent.id(), self.settings.completion_tool.as_deref()),
                None,
            );
            conversation.append(MessageRole::User, contract_message(&state.contract), None);
            state.conversation = Some(conversation);
            state.transition(AgentStatus::Running)?;
        }
        info!(agent_id = %agent.id(), "agent run started");
        emitter.announce_status(agent, AgentStatus::Running).await;
        Ok(())
    }

    /// Run the turn loop of an agent already moved to `Running` by [`Self::begin`].
    ///
    /// Never leaves the agent `Running`; the transcript is persisted whatever
    /// the outcome.
    pub async fn drive(&self, agent: &AgentHandle, emitter: &OutputEmitter) -> AgentStatus {
        if let Err(err) = self.turn_loop(agent, emitter).await {
            error!(agent_id = %agent.id(), %err, "agent run failed");
            emitter
                .emit_output(agent, OutputKind::Error, format!("Agent error: {err}"), None)
                .await;
            if let Err(err) = emitter.emit_status(agent, AgentStatus::Stopped).await {
                warn!(agent_id = %agent.id(), %err, "could not stop failed agent");
            }
        }

        let snapshot = agent.snapshot().await;
        match self.transcripts.persist(&snapshot).await {
            Ok(Some(path)) => info!(agent_id = %agent.id(), path = %path.display(), "transcript saved"),
            Ok(None) => {}
            Err(err) => warn!(agent_id = %agent.id(), %err, "failed to write transcript"),
        }
        info!(agent_id = %agent.id(), status = %snapshot.status(), "agent run finished");
        snapshot.status()
    }

    async fn turn_loop(&self, agent: &AgentHandle, emitter: &OutputEmitter) -> Result<(), AgentError> {
        let catalog = self.tools.all_tools().await;
        let mut tools_enabled = !catalog.is_empty();

        loop {
            if agent.stop_requested() || agent.status().await == AgentStatus::Completed {
                break;
            }

            let response = self
                .request_turn(agent, emitter, &catalog, &mut tools_enabled)
                .await?;

            if agent.status().await == AgentStatus::Completed {
                debug!(agent_id = %agent.id(), "completed while awaiting the turn; response discarded");
                break;
            }

            if let Some(signal) = detect_marker(&response.content) {
                emitter
                    .emit_output(agent, OutputKind::Assistant, response.content.clone(), None)
                    .await;
                append(agent, Message::new(MessageRole::Assistant, response.content)).await;
                let status = match signal {
                    ContractSignal::Complete => AgentStatus::Completed,
                    ContractSignal::Failed => AgentStatus::Stopped,
                };
                emitter.emit_status(agent, status).await?;
                return Ok(());
            }

            if response.tool_calls.is_empty() {
                emitter
                    .emit_output(agent, OutputKind::Assistant, response.content.clone(), None)
                    .await;
                append(agent, Message::new(MessageRole::Assistant, response.content)).await;
            } else {
                self.process_tool_calls(agent, emitter, response).await;
            }
        }

        match agent.status().await {
            AgentStatus::Completed => {
                emitter.announce_status(agent, AgentStatus::Completed).await;
            }
            AgentStatus::Running if agent.stop_requested() => {
                info!(agent_id = %agent.id(), "stop requested; halting agent");
                emitter.emit_status(agent, AgentStatus::Stopped).await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// One inference turn. A rejected tool catalog is retried once without
    /// tools, which stay disabled for the rest of the run.
    async fn request_turn(
        &self,
        agent: &AgentHandle,
        emitter: &OutputEmitter,
        catalog: &[ToolDefinition],
        tools_enabled: &mut bool,
    ) -> Result<ModelResponse, AgentError> {
        let messages = {
            let state = agent.lock().await;
            state
                .conversation
                .as_ref()
                .map(Conversation::to_backend_format)
                .unwrap_or_default()
        };
        let request = ModelRequest::new(self.settings.model.clone(), messages);
        let request = if *tools_enabled {
            request.with_tools(catalog.to_vec())
        } else {
            request
        };

        debug!(agent_id = %agent.id(), messages = request.messages.len(), "requesting turn");
        let fallback = (*tools_enabled).then(|| request.without_tools());
        match self.provider.chat(request).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_tools_rejected() => {
                let Some(fallback) = fallback else {
                    return Err(err.into());
                };
                warn!(agent_id = %agent.id(), %err, "tool catalog rejected; continuing without tools");
                *tools_enabled = false;
                emitter
                    .emit_output(
                        agent,
                        OutputKind::System,
                        format!("Note: {} doesn't support tool calling.", self.settings.model),
                        None,
                    )
                    .await;
                let mut response = self.provider.chat(fallback).await?;
                response.tools_unsupported = true;
                Ok(response)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Execute every requested call in order. One failing call becomes an
    /// `Error: ...` tool result; the run goes on.
    async fn process_tool_calls(
        &self,
        agent: &AgentHandle,
        emitter: &OutputEmitter,
        response: ModelResponse,
    ) {
        if !response.content.trim().is_empty() {
            emitter
                .emit_output(agent, OutputKind::Assistant, response.content.clone(), None)
                .await;
        }
        let mut executed = Vec::with_capacity(response.tool_calls.len());
        let mut results = Vec::with_capacity(response.tool_calls.len());
        for call in response.tool_calls {
            if agent.stop_requested() {
                info!(agent_id = %agent.id(), "stop requested between tool calls");
                break;
            }

            emitter
                .emit_output(agent, OutputKind::ToolCall, "", Some(self.display(&call)))
                .await;

            let result = match self.tools.call_request(&call).await {
                Ok(text) => {
                    debug!(agent_id = %agent.id(), tool = %call.name, "tool call succeeded");
                    emitter
                        .emit_output(
                            agent,
                            OutputKind::ToolResult,
                            format!("→ {}", truncate(&text, RESULT_PREVIEW_CHARS)),
                            None,
                        )
                        .await;
                    text
                }
                Err(err) => {
                    warn!(agent_id = %agent.id(), tool = %call.name, %err, "tool call failed");
                    let text = format!("Error: {err}");
                    emitter
                        .emit_output(agent, OutputKind::Error, text.clone(), None)
                        .await;
                    text
                }
            };
            results.push(Message::new(MessageRole::Tool, result).with_tool_call_id(call.id.clone()));
            executed.push(call);
        }

        // The placeholder only annotates calls that actually produced a result.
        if executed.is_empty() {
            if !response.content.trim().is_empty() {
                append(agent, Message::new(MessageRole::Assistant, response.content)).await;
            }
            return;
        }
        let annotation = serde_json::to_string(&executed).unwrap_or_default();
        append(
            agent,
            Message::new(MessageRole::Assistant, response.content).with_tool_calls(annotation),
        )
        .await;
        for message in results {
            append(agent, message).await;
        }
    }

    fn display(&self, call: &ToolCallRequest) -> String {
        match call.keyword_arguments() {
            Ok(arguments) => self.tools.format_display(&call.name, &arguments),
            Err(_) => truncate(&format!("{} {}", call.name, call.arguments), DISPLAY_WIDTH),
        }
    }
}

async fn append(agent: &AgentHandle, message: Message) {
    let mut state = agent.lock().await;
    if let Some(conversation) = state.conversation.as_mut() {
        conversation.push(message);
    }
}
