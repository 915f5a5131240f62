//! Model types - reply and error types

use crate::domain::types::ToolCallRequest;
use reqwest::StatusCode;
use thiserror::Error;

/// What the model produced for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            text: String::new(),
            tool_calls: calls,
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' requires an API key (set {env_var})")]
    MissingApiKey { provider: String, env_var: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
            env_var: env_var.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Short explanation suitable for an API caller.
    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey { provider, env_var } => {
                format!("Model provider '{provider}' needs an API key; set {env_var}.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Cannot reach model provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("Request to model provider '{provider}' timed out.")
                } else if let Some(status) = source.status() {
                    match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            format!("Model provider '{provider}' rejected the API key.")
                        }
                        StatusCode::NOT_FOUND => {
                            format!("Model provider endpoint '{provider}' was not found.")
                        }
                        StatusCode::TOO_MANY_REQUESTS => {
                            format!("Model provider '{provider}' is rate limiting requests.")
                        }
                        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                            format!("Model provider '{provider}' is unavailable.")
                        }
                        _ => format!("Request to '{provider}' failed: {}", status.as_u16()),
                    }
                } else {
                    format!("Network error talking to model provider '{provider}'.")
                }
            }
            ModelError::InvalidResponse { provider, .. } => {
                format!("Model provider '{provider}' returned an unusable response.")
            }
        }
    }
}
