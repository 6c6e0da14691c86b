use super::completion::complete_agent;
use super::emitter::OutputEmitter;
use super::errors::AgentError;
use super::report::{AgentStatusReport, AgentSummary, AgentView};
use super::runner::AgentRunner;
use super::store::{AgentStore, SharedAgent};
use crate::domain::{AgentStatus, Payload};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Caller-facing lifecycle operations over the agent store.
#[derive(Clone)]
pub struct AgentService {
    store: Arc<AgentStore>,
    runner: Arc<AgentRunner>,
    public_url: String,
}

impl AgentService {
    pub fn new(store: Arc<AgentStore>, runner: Arc<AgentRunner>, public_url: impl Into<String>) -> Self {
        Self {
            store,
            runner,
            public_url: public_url.into(),
        }
    }

    pub fn store(&self) -> &Arc<AgentStore> {
        &self.store
    }

    pub fn runner(&self) -> &Arc<AgentRunner> {
        &self.runner
    }

    pub async fn create(&self) -> AgentStatusReport {
        let agent = self.store.create().await;
        self.report_for(&agent).await
    }

    pub async fn get(&self, id: &str) -> Result<SharedAgent, AgentError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| AgentError::not_found(id))
    }

    pub async fn list(&self) -> Vec<AgentSummary> {
        let mut summaries = Vec::new();
        for agent in self.store.list().await {
            summaries.push(AgentSummary::from(&*agent.lock().await));
        }
        summaries
    }

    pub async fn view(&self, id: &str) -> Result<AgentView, AgentError> {
        let agent = self.get(id).await?;
        let state = agent.lock().await;
        Ok(AgentView::from(&*state))
    }

    pub async fn report(&self, id: &str) -> Result<AgentStatusReport, AgentError> {
        let agent = self.get(id).await?;
        Ok(self.report_for(&agent).await)
    }

    /// Replace the contract. Only allowed while `Ready`.
    pub async fn set_contract(&self, id: &str, contract: impl Into<String>) -> Result<(), AgentError> {
        let agent = self.get(id).await?;
        let mut state = agent.lock().await;
        if state.status() != AgentStatus::Ready {
            return Err(AgentError::invalid_state(id, state.status(), "set the contract of"));
        }
        state.contract = contract.into();
        Ok(())
    }

    /// Start a run on a spawned task. Validation errors are returned before spawning.
    pub async fn start(
        &self,
        id: &str,
        emitter: OutputEmitter,
    ) -> Result<JoinHandle<AgentStatus>, AgentError> {
        let agent = self.get(id).await?;
        self.runner.begin(&agent, &emitter).await?;
        let runner = self.runner.clone();
        Ok(tokio::spawn(async move {
            runner.drive(&agent, &emitter).await
        }))
    }

    pub async fn start_headless(&self, id: &str) -> Result<AgentStatusReport, AgentError> {
        self.start(id, OutputEmitter::Recording).await?;
        self.report(id).await
    }

    /// Create an agent for `contract` and start it headless.
    pub async fn launch(&self, contract: impl Into<String>) -> Result<AgentStatusReport, AgentError> {
        let agent = self.store.create().await;
        agent.lock().await.contract = contract.into();
        info!(agent_id = %agent.id(), "launching headless agent");
        self.start_headless(agent.id()).await
    }

    /// Ask the agent to stop. Always accepted; repeated calls change nothing.
    pub async fn stop(&self, id: &str) -> Result<AgentStatusReport, AgentError> {
        let agent = self.get(id).await?;
        agent.request_stop();
        info!(agent_id = %id, "stop requested");
        Ok(self.report_for(&agent).await)
    }

    /// Return a finished (or never started) agent to `Ready`.
    pub async fn reset(&self, id: &str) -> Result<AgentStatusReport, AgentError> {
        let agent = self.get(id).await?;
        {
            let mut state = agent.lock().await;
            if state.status() == AgentStatus::Running {
                return Err(AgentError::invalid_state(id, AgentStatus::Running, "reset"));
            }
            state.reset();
            agent.clear_stop();
        }
        Ok(self.report_for(&agent).await)
    }

    /// Remove the agent, stopping it first if it is running.
    pub async fn delete(&self, id: &str) -> Result<(), AgentError> {
        let agent = self
            .store
            .remove(id)
            .await
            .ok_or_else(|| AgentError::not_found(id))?;
        agent.request_stop();
        info!(agent_id = %id, "agent deleted");
        Ok(())
    }

    pub async fn payload(&self, id: &str) -> Result<Option<Payload>, AgentError> {
        let agent = self.get(id).await?;
        let state = agent.lock().await;
        Ok(state.payload().cloned())
    }

    pub async fn complete(
        &self,
        id: &str,
        summary: &str,
        payload: Option<&str>,
    ) -> Result<AgentStatusReport, AgentError> {
        let agent = self.get(id).await?;
        complete_agent(&agent, summary, payload).await?;
        Ok(self.report_for(&agent).await)
    }

    async fn report_for(&self, agent: &SharedAgent) -> AgentStatusReport {
        AgentStatusReport::from_agent(&*agent.lock().await, &self.public_url)
    }
}
