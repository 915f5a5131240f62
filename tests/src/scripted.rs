//! A model provider that replays canned replies.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use toolpilot_core::ToolCatalog;
use toolpilot_core::model::{ModelError, ModelProvider, ModelReply};
use toolpilot_core::types::ToolCallRequest;
use toolpilot_session::Turn;

#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ModelReply>>,
    histories: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            histories: Mutex::default(),
        }
    }

    /// Every history the provider was asked about, in order.
    pub fn histories(&self) -> Vec<Vec<Turn>> {
        self.histories.lock().unwrap().clone()
    }
}

/// A reply requesting a single tool call.
pub fn call(name: &str, arguments: &str) -> ModelReply {
    ModelReply::tool_calls(vec![ToolCallRequest::new(name, arguments)])
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn ask(&self, history: &[Turn], _catalog: &ToolCatalog) -> Result<ModelReply, ModelError> {
        self.histories.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::invalid_response("scripted", "script exhausted"))
    }
}
