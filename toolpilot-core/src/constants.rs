//! Application constants
//!
//! Single source of truth for paths and defaults.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/client.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// Name under which the tool server's sub-sessions are acquired
pub const DEFAULT_SERVER_NAME: &str = "tool_server";

pub const DEFAULT_TOOL_URL: &str = "http://localhost:8000/mcp";
pub const DEFAULT_MODEL_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_MODEL_API_PATH: &str = "/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_CONVERSATION_DIR: &str = "conversations";
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8001";

/// Appended when the iteration budget runs out without a final answer
pub const BUDGET_EXHAUSTED_MESSAGE: &str = "Error: exceeded maximum reasoning steps.";
