//! OpenAI-compatible chat-completions client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::application::catalog::ToolCatalog;
use crate::config::ModelConfig;
use crate::domain::types::ToolCallRequest;
use crate::infrastructure::model::adapter::MessageAdapter;
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::{ModelError, ModelReply};
use toolpilot_session::Turn;

const PROVIDER_ID: &str = "openai";

/// Works with any endpoint that speaks the chat-completions dialect.
#[derive(Clone)]
pub struct OpenAiClient {
    base: HttpClientBase,
    api_path: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    /// The API key is read from `config.api_key_env` once, here.
    pub fn from_config(config: &ModelConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &ModelConfig, api_key: Option<String>) -> Self {
        Self {
            base: HttpClientBase::new(
                PROVIDER_ID.to_string(),
                config.endpoint.clone(),
                api_key,
                config.api_key_env.clone(),
                config.request_timeout,
            ),
            api_path: config.api_path.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, history: &[Turn], catalog: &ToolCatalog) -> OpenAiRequest {
        let has_tools = !catalog.is_empty();
        OpenAiRequest {
            model: self.model.clone(),
            messages: MessageAdapter::to_openai_format(history),
            tools: has_tools.then(|| catalog.schemas().cloned().collect()),
            tool_choice: has_tools.then_some("auto"),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiClient {
    async fn ask(&self, history: &[Turn], catalog: &ToolCatalog) -> Result<ModelReply, ModelError> {
        let url = self.base.build_url(&self.api_path);
        let payload = self.build_request(history, catalog);

        info!(
            provider = self.base.id.as_str(),
            model = self.model.as_str(),
            messages = history.len(),
            tools = catalog.len(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: OpenAiResponse = self.base.post_with_bearer(&url, &payload).await?;
        let reply = into_reply(&self.base.id, response)?;
        debug!(
            text_len = reply.text.len(),
            tool_calls = reply.tool_calls.len(),
            "Received response from OpenAI-compatible provider"
        );
        Ok(reply)
    }
}

fn into_reply(provider: &str, response: OpenAiResponse) -> Result<ModelReply, ModelError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .ok_or_else(|| ModelError::invalid_response(provider, "missing message"))?;

    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCallRequest {
            id: call.id,
            name: call.function.name,
            arguments: match call.function.arguments {
                Value::Null => String::new(),
                Value::String(text) => text,
                // Some compatible servers send the arguments already decoded.
                other => other.to_string(),
            },
        })
        .collect();

    Ok(ModelReply {
        text: message.content.unwrap_or_default(),
        tool_calls,
    })
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessage>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    #[serde(default)]
    id: Option<String>,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}
