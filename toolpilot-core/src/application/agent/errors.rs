use crate::infrastructure::model::ModelError;
use crate::infrastructure::transport::TransportError;
use thiserror::Error;

/// Failures that abort a query.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Connection(#[from] TransportError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Connection(err) => match err {
                TransportError::Spawn { server, .. } => {
                    format!("Could not start tool server '{server}'.")
                }
                TransportError::Connect { server, .. } | TransportError::Http { server, .. } => {
                    format!("Could not reach tool server '{server}'.")
                }
                other => format!("Tool server connection failed: {other}"),
            },
            AgentError::Model(err) => err.user_message(),
        }
    }
}

/// Failures of a single tool call. These become error turns, not aborts.
#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("unknown tool requested: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("tool '{tool}' is missing required arguments: {}", .missing.join(", "))]
    MissingArguments { tool: String, missing: Vec<String> },
    #[error("failed to execute tool '{tool}': {source}")]
    Execution {
        tool: String,
        #[source]
        source: TransportError,
    },
    /// The tool ran and reported failure itself.
    #[error("{message}")]
    Reported { tool: String, message: String },
}

impl ToolCallError {
    pub fn tool(&self) -> &str {
        match self {
            ToolCallError::UnknownTool(tool)
            | ToolCallError::InvalidArguments { tool, .. }
            | ToolCallError::MissingArguments { tool, .. }
            | ToolCallError::Execution { tool, .. }
            | ToolCallError::Reported { tool, .. } => tool,
        }
    }
}
