use crate::domain::{Agent, AgentStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::debug;

/// One stored agent: its state behind a lock plus a lock-free stop flag.
#[derive(Debug)]
pub struct AgentHandle {
    id: String,
    stop_requested: AtomicBool,
    state: Mutex<Agent>,
}

pub type SharedAgent = Arc<AgentHandle>;

impl AgentHandle {
    pub fn new(agent: Agent) -> Self {
        Self {
            id: agent.id().to_string(),
            stop_requested: AtomicBool::new(false),
            state: Mutex::new(agent),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ask a running loop to stop at its next check point.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn clear_stop(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
    }

    pub async fn lock(&self) -> MutexGuard<'_, Agent> {
        self.state.lock().await
    }

    pub async fn status(&self) -> AgentStatus {
        self.state.lock().await.status()
    }

    pub async fn snapshot(&self) -> Agent {
        self.state.lock().await.clone()
    }
}

/// Process-wide registry of agents keyed by generated id (`agent-1`, `agent-2`, ...).
#[derive(Debug)]
pub struct AgentStore {
    agents: RwLock<HashMap<String, SharedAgent>>,
    counter: AtomicU64,
}

impl Default for AgentStore {
    fn default() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            counter: AtomicU64::new(1),
        }
    }
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> SharedAgent {
        let id = format!("agent-{}", self.counter.fetch_add(1, Ordering::SeqCst));
        let handle = Arc::new(AgentHandle::new(Agent::new(id.clone())));
        self.agents.write().await.insert(id.clone(), handle.clone());
        debug!(agent_id = %id, "agent created");
        handle
    }

    pub async fn get(&self, id: &str) -> Option<SharedAgent> {
        self.agents.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<SharedAgent> {
        self.agents.write().await.remove(id)
    }

    /// All agents ordered by creation.
    pub async fn list(&self) -> Vec<SharedAgent> {
        let handles: Vec<SharedAgent> = self.agents.read().await.values().cloned().collect();
        let mut keyed = Vec::with_capacity(handles.len());
        for handle in handles {
            let created_at = handle.lock().await.created_at();
            keyed.push((created_at, sequence(handle.id()), handle));
        }
        keyed.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        keyed.into_iter().map(|(_, _, handle)| handle).collect()
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }
}

fn sequence(id: &str) -> u64 {
    id.rsplit('-')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generates_sequential_ids() {
        let store = AgentStore::new();
        let first = store.create().await;
        let second = store.create().await;
        assert_eq!(first.id(), "agent-1");
        assert_eq!(second.id(), "agent-2");
        assert_eq!(store.len().await, 2);

        let ids: Vec<_> = store
            .list()
            .await
            .iter()
            .map(|handle| handle.id().to_string())
            .collect();
        assert_eq!(ids, vec!["agent-1", "agent-2"]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_removal() {
        let store = AgentStore::new();
        let first = store.create().await;
        assert!(store.remove(first.id()).await.is_some());
        assert!(store.get("agent-1").await.is_none());
        let next = store.create().await;
        assert_eq!(next.id(), "agent-2");
    }

    #[tokio::test]
    async fn stop_flag_is_sticky_until_cleared() {
        let store = AgentStore::new();
        let agent = store.create().await;
        assert!(!agent.stop_requested());
        agent.request_stop();
        agent.request_stop();
        assert!(agent.stop_requested());
        agent.clear_stop();
        assert!(!agent.stop_requested());
    }
}
