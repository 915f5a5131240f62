use super::app::{AgentConfig, AppConfig, RestServerConfig};
use super::error::ConfigError;
use super::model::ModelConfig;
use super::transport::{TransportConfig, TransportKind};
use crate::constants::{CONFIG_PATH, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Once;
use std::time::Duration;
use tracing::{debug, warn};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawConfig {
    #[serde(default)]
    transport: RawTransport,
    #[serde(default)]
    model: RawModel,
    #[serde(default)]
    agent: RawAgent,
    #[serde(default)]
    server: RawServer,
}

#[derive(Debug, Deserialize, Default)]
struct RawTransport {
    name: Option<String>,
    kind: Option<TransportKind>,
    target: Option<String>,
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawModel {
    endpoint: Option<String>,
    api_path: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawAgent {
    max_iterations: Option<usize>,
    conversation_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawServer {
    addr: Option<String>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Load configuration: file (if any), then environment overrides.
///
/// A missing default file means built-in defaults; a missing explicit file
/// is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let raw = match path {
        Some(path) => read_raw(path)?,
        None => match read_raw(Path::new(CONFIG_PATH)) {
            Err(ConfigError::NotFound { path }) => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                RawConfig::default()
            }
            other => other?,
        },
    };
    let mut config = validate_and_build(raw)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parse and validate TOML text without touching files or the environment.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: PathBuf::from("<inline>"),
        source,
    })?;
    validate_and_build(raw)
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    debug!(path = %path.display(), "Reading client configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn expand(value: &str) -> String {
    shellexpand::full(value)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

fn validate_and_build(raw: RawConfig) -> Result<AppConfig, ConfigError> {
    let transport_defaults = TransportConfig::default();
    let kind = raw.transport.kind.unwrap_or(transport_defaults.kind);
    let target = match raw.transport.target {
        Some(target) if kind == TransportKind::LocalPipe => expand(&target),
        Some(target) => target,
        None if kind.is_http() => transport_defaults.target,
        None => String::new(),
    };
    let transport = TransportConfig {
        name: raw.transport.name.unwrap_or(transport_defaults.name),
        kind,
        target,
        command: raw.transport.command.map(|command| expand(&command)),
        args: raw.transport.args.iter().map(|arg| expand(arg)).collect(),
        env: raw.transport.env,
        workdir: raw.transport.workdir.map(|dir| PathBuf::from(expand(&dir))),
        headers: raw.transport.headers,
        request_timeout: seconds(
            "transport.request_timeout_secs",
            raw.transport.request_timeout_secs,
            transport_defaults.request_timeout,
        )?,
    };

    let model_defaults = ModelConfig::default();
    let temperature = raw.model.temperature.unwrap_or(model_defaults.temperature);
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::invalid(
            "model.temperature",
            format!("{temperature} is outside 0.0..=2.0"),
        ));
    }
    let max_tokens = raw.model.max_tokens.unwrap_or(model_defaults.max_tokens);
    if max_tokens == 0 {
        return Err(ConfigError::invalid("model.max_tokens", "must be positive"));
    }
    let model = ModelConfig {
        endpoint: raw.model.endpoint.unwrap_or(model_defaults.endpoint),
        api_path: raw.model.api_path.unwrap_or(model_defaults.api_path),
        model: raw.model.model.unwrap_or(model_defaults.model),
        api_key_env: raw.model.api_key_env.unwrap_or(model_defaults.api_key_env),
        temperature,
        max_tokens,
        request_timeout: seconds(
            "model.request_timeout_secs",
            raw.model.request_timeout_secs,
            model_defaults.request_timeout,
        )?,
    };

    let agent_defaults = AgentConfig::default();
    let max_iterations = raw.agent.max_iterations.unwrap_or(agent_defaults.max_iterations);
    if max_iterations == 0 {
        return Err(ConfigError::invalid("agent.max_iterations", "must be positive"));
    }
    let agent = AgentConfig {
        max_iterations,
        conversation_dir: raw
            .agent
            .conversation_dir
            .map(|dir| PathBuf::from(expand(&dir)))
            .unwrap_or(agent_defaults.conversation_dir),
    };

    let addr = raw.server.addr.unwrap_or(RestServerConfig::default().addr);
    SocketAddr::from_str(&addr)
        .map_err(|err| ConfigError::invalid("server.addr", format!("'{addr}': {err}")))?;

    Ok(AppConfig {
        transport,
        model,
        agent,
        rest: RestServerConfig { addr },
    })
}

fn seconds(
    field: &'static str,
    value: Option<u64>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::invalid(field, "must be positive")),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(default),
    }
}

/// Apply the environment variables the client recognises.
///
/// Values that fail to parse are reported and ignored, keeping the current
/// setting.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(mode) = var("MCP_MODE") {
        match mode.parse::<TransportKind>() {
            Ok(kind) => config.transport.kind = kind,
            Err(reason) => warn!(key = "MCP_MODE", value = %mode, %reason, "ignoring invalid override"),
        }
    }
    match config.transport.kind {
        TransportKind::LocalPipe => {
            if let Some(path) = var("SERVER_SCRIPT_PATH") {
                config.transport.target = expand(path.trim());
            }
        }
        TransportKind::HttpStream | TransportKind::EventStream => {
            if let Some(url) = var("MCP_TOOL_URL") {
                config.transport.target = url.trim().to_string();
            }
        }
    }

    if let Some(model) = var("OPENAI_MODEL") {
        config.model.model = model.trim().to_string();
    }
    if let Some(url) = var("OPENAI_BASE_URL") {
        config.model.endpoint = url.trim().to_string();
    }
    override_parsed(&var, "TEMPERATURE", &mut config.model.temperature, |t| {
        (0.0..=2.0).contains(t)
    });
    override_parsed(&var, "MAX_TOKENS", &mut config.model.max_tokens, |n| *n > 0);
    let mut timeout_secs = config.model.request_timeout.as_secs();
    override_parsed(&var, "REQUEST_TIMEOUT", &mut timeout_secs, |n| *n > 0);
    config.model.request_timeout = Duration::from_secs(timeout_secs);
    override_parsed(&var, "MAX_ITERATIONS", &mut config.agent.max_iterations, |n| *n > 0);
    if let Some(dir) = var("CONVERSATION_DIR") {
        config.agent.conversation_dir = PathBuf::from(expand(dir.trim()));
    }
}

fn override_parsed<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    slot: &mut T,
    valid: impl Fn(&T) -> bool,
) {
    let Some(raw) = var(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => *slot = value,
        _ => warn!(key, value = %raw, "ignoring invalid override"),
    }
}
