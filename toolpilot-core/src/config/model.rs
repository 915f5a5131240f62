use crate::constants::{
    DEFAULT_API_KEY_ENV, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_MODEL_API_PATH,
    DEFAULT_MODEL_ENDPOINT, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_TEMPERATURE,
};
use std::time::Duration;

/// OpenAI-compatible model endpoint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub endpoint: String,
    pub api_path: String,
    pub model: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            api_path: DEFAULT_MODEL_API_PATH.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}
