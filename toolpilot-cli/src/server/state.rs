use std::sync::Arc;
use toolpilot_core::Agent;
use toolpilot_core::model::ModelProvider;

pub(crate) struct ServerState<P: ModelProvider> {
    agent: Arc<Agent<P>>,
}

impl<P: ModelProvider> ServerState<P> {
    pub(crate) fn new(agent: Arc<Agent<P>>) -> Self {
        Self { agent }
    }

    pub(crate) fn agent(&self) -> Arc<Agent<P>> {
        Arc::clone(&self.agent)
    }
}
