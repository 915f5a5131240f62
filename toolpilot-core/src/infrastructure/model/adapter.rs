//! Message adapters - convert conversation turns to API formats

use serde_json::{Value, json};
use toolpilot_session::{Role, Turn};

pub struct MessageAdapter;

impl MessageAdapter {
    /// `[{"role": "...", "content": "..."}]`
    ///
    /// Tool results travel as user messages: they are not answers to a
    /// specific provider-issued call id.
    pub fn to_openai_format(turns: &[Turn]) -> Vec<Value> {
        turns
            .iter()
            .map(|turn| {
                json!({
                    "role": Self::openai_role(turn.role()),
                    "content": turn.content()
                })
            })
            .collect()
    }

    fn openai_role(role: Role) -> &'static str {
        match role {
            Role::User | Role::ToolResult => "user",
            Role::Assistant => "assistant",
        }
    }
}
