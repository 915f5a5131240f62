use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    /// Output of a tool invocation, fed back to the model as user input.
    ToolResult,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "tool_result",
        }
    }
}

/// One immutable entry of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool: Option<String>,
    created_at: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>, tool: Option<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, None)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, None)
    }

    /// Successful tool output. `payload` is embedded as compact JSON.
    pub fn tool_result(tool: impl Into<String>, payload: &Value) -> Self {
        let tool = tool.into();
        let content = format!("Tool {tool} result:\n{}", encode(payload));
        Self::new(Role::ToolResult, content, Some(tool))
    }

    /// Failed tool call. The failure is handed to the model as data so it can
    /// decide how to proceed.
    pub fn tool_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        let tool = tool.into();
        let payload = serde_json::json!({ "error": message.into() });
        let content = format!("Tool {tool} error:\n{}", encode(&payload));
        Self::new(Role::ToolResult, content, Some(tool))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

fn encode(payload: &Value) -> String {
    // Serializing a `Value` cannot fail: map keys are always strings.
    serde_json::to_string(payload).unwrap_or_else(|_| payload.to_string())
}
