pub mod app;
pub mod error;
pub mod loader;
pub mod model;
pub mod transport;

pub use crate::constants::{CONFIG_PATH, ENV_PATH};
pub use app::{AgentConfig, AppConfig, RestServerConfig};
pub use error::ConfigError;
pub use loader::{apply_env_overrides, ensure_env_loaded, load_config, parse_config};
pub use model::ModelConfig;
pub use transport::{TransportConfig, TransportKind};
