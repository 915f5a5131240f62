//! The bounded model/tool loop.

mod arguments;
mod errors;
mod models;
mod runner;


pub use errors::{AgentError, ToolCallError};
pub use models::{LoopOutcome, LoopStatus};

use crate::config::AppConfig;
use crate::constants::DEFAULT_MAX_ITERATIONS;
use crate::infrastructure::model::{ModelProvider, OpenAiClient};
use crate::infrastructure::transport::{ToolConnector, TransportConnector};
use std::sync::Arc;
use toolpilot_session::{ConversationLogger, FileConversationLogger};

/// Answers queries by alternating model calls and tool calls.
///
/// Each query opens its own tool-server session through the connector and
/// closes it before returning.
pub struct Agent<P: ModelProvider> {
    provider: P,
    connector: Arc<dyn ToolConnector>,
    logger: Arc<dyn ConversationLogger>,
    max_iterations: usize,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(
        provider: P,
        connector: Arc<dyn ToolConnector>,
        logger: Arc<dyn ConversationLogger>,
    ) -> Self {
        Self {
            provider,
            connector,
            logger,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Bound on model calls per query; clamped to at least 1.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl Agent<OpenAiClient> {
    /// Production wiring: OpenAI-compatible model, configured transport,
    /// file logger.
    pub fn from_config(config: &AppConfig) -> Self {
        Agent::new(
            OpenAiClient::from_config(&config.model),
            Arc::new(TransportConnector::new(config.transport.clone())),
            Arc::new(FileConversationLogger::new(
                config.agent.conversation_dir.clone(),
            )),
        )
        .with_max_iterations(config.agent.max_iterations)
    }
}
