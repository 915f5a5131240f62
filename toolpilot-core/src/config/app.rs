use super::error::ConfigError;
use super::model::ModelConfig;
use super::transport::TransportConfig;
use crate::constants::{DEFAULT_CONVERSATION_DIR, DEFAULT_MAX_ITERATIONS, DEFAULT_REST_ADDR};
use std::path::{Path, PathBuf};

/// Application configuration loaded from client.toml, `.env` and the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub transport: TransportConfig,
    pub model: ModelConfig,
    pub agent: AgentConfig,
    pub rest: RestServerConfig,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }
}

/// Orchestration loop settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Upper bound on model calls per query. Always at least 1.
    pub max_iterations: usize,
    pub conversation_dir: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            conversation_dir: PathBuf::from(DEFAULT_CONVERSATION_DIR),
        }
    }
}

/// HTTP front door settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RestServerConfig {
    pub addr: String,
}

impl Default for RestServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_REST_ADDR.to_string(),
        }
    }
}
