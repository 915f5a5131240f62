use serde::Serialize;
use toolpilot_session::{Conversation, Turn};

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    /// The model produced a final answer.
    Done,
    /// The iteration budget ran out first.
    BudgetExhausted,
    /// The model produced neither text nor tool calls.
    Idle,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoopOutcome {
    pub status: LoopStatus,
    pub model_calls: usize,
    pub turns: Vec<Turn>,
}

impl LoopOutcome {
    pub(super) fn new(conversation: Conversation, status: LoopStatus, model_calls: usize) -> Self {
        Self {
            status,
            model_calls,
            turns: conversation.into_turns(),
        }
    }

    /// Content of the last assistant turn, if any.
    pub fn answer(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.is_assistant())
            .map(Turn::content)
    }
}
