use crate::agent::AgentService;
use crate::tooling::ToolRouter;
use std::sync::Arc;

pub(crate) struct ServerState {
    service: AgentService,
    model: String,
}

impl ServerState {
    pub(crate) fn new(service: AgentService) -> Self {
        let model = service.runner().settings().model.clone();
        Self { service, model }
    }

    pub(crate) fn service(&self) -> &AgentService {
        &self.service
    }

    pub(crate) fn tools(&self) -> &Arc<ToolRouter> {
        self.service.runner().tools()
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }
}
