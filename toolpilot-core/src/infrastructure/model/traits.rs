//! Model traits

use super::types::{ModelError, ModelReply};
use crate::application::catalog::ToolCatalog;
use async_trait::async_trait;
use toolpilot_session::Turn;

/// A language model that can either answer or request tool calls.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Ask the model about the full conversation so far, offering `catalog`.
    async fn ask(&self, history: &[Turn], catalog: &ToolCatalog) -> Result<ModelReply, ModelError>;
}
