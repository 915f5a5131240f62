// Config loading tests - file handling and environment overrides.
//
// Tests that touch the process environment run under #[serial].

use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;
use toolpilot_core::config::{AppConfig, ConfigError, TransportKind};

const OVERRIDE_KEYS: &[&str] = &[
    "MCP_MODE",
    "MCP_TOOL_URL",
    "SERVER_SCRIPT_PATH",
    "OPENAI_MODEL",
    "OPENAI_BASE_URL",
    "TEMPERATURE",
    "MAX_TOKENS",
    "REQUEST_TIMEOUT",
    "MAX_ITERATIONS",
    "CONVERSATION_DIR",
];

fn clear_overrides() {
    for key in OVERRIDE_KEYS {
        // SAFETY: callers are #[serial], no other test thread reads the environment.
        unsafe { env::remove_var(key) };
    }
}

fn set_override(key: &str, value: &str) {
    // SAFETY: see `clear_overrides`.
    unsafe { env::set_var(key, value) };
}

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("client.toml");
    fs::write(&path, content).expect("write client.toml");
    path
}

const FULL_CONFIG: &str = r#"
[transport]
name = "calculator"
kind = "stdio"
target = "servers/calc.py"
args = ["--verbose"]
request_timeout_secs = 15

[model]
endpoint = "http://localhost:11434"
model = "llama3"
api_key_env = "LOCAL_KEY"
temperature = 0.7
max_tokens = 512

[agent]
max_iterations = 8
conversation_dir = "logs/conversations"

[server]
addr = "127.0.0.1:9001"
"#;

#[test]
#[serial]
fn returns_error_when_explicit_file_not_found() {
    clear_overrides();
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/client.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
#[serial]
fn loads_every_section_from_file() {
    clear_overrides();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), FULL_CONFIG);

    let config = AppConfig::load(Some(&path)).expect("load");

    assert_eq!(config.transport.name, "calculator");
    assert_eq!(config.transport.kind, TransportKind::LocalPipe);
    assert_eq!(config.transport.target, "servers/calc.py");
    assert_eq!(config.transport.args, vec!["--verbose"]);
    assert_eq!(config.transport.request_timeout, Duration::from_secs(15));
    assert_eq!(config.model.endpoint, "http://localhost:11434");
    assert_eq!(config.model.model, "llama3");
    assert_eq!(config.model.api_key_env, "LOCAL_KEY");
    assert_eq!(config.model.max_tokens, 512);
    assert_eq!(config.agent.max_iterations, 8);
    assert_eq!(config.agent.conversation_dir, PathBuf::from("logs/conversations"));
    assert_eq!(config.rest.addr, "127.0.0.1:9001");
}

#[test]
#[serial]
fn rejects_malformed_toml() {
    clear_overrides();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[transport\nkind = ");

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
#[serial]
fn rejects_unknown_sections() {
    clear_overrides();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[providers]\nid = \"x\"\n");

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
#[serial]
fn rejects_zero_budget() {
    clear_overrides();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[agent]\nmax_iterations = 0\n");

    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::Invalid {
            field: "agent.max_iterations",
            ..
        })
    ));
}

#[test]
#[serial]
fn environment_overrides_file() {
    clear_overrides();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), FULL_CONFIG);
    set_override("MCP_MODE", "sse");
    set_override("MCP_TOOL_URL", "http://tools.internal:8000/sse");
    set_override("OPENAI_MODEL", "gpt-4o-mini");
    set_override("MAX_ITERATIONS", "3");
    set_override("REQUEST_TIMEOUT", "90");

    let config = AppConfig::load(Some(&path)).expect("load");
    clear_overrides();

    assert_eq!(config.transport.kind, TransportKind::EventStream);
    assert_eq!(config.transport.target, "http://tools.internal:8000/sse");
    assert_eq!(config.model.model, "gpt-4o-mini");
    assert_eq!(config.agent.max_iterations, 3);
    assert_eq!(config.model.request_timeout, Duration::from_secs(90));
}

#[test]
#[serial]
fn invalid_overrides_keep_file_values() {
    clear_overrides();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), FULL_CONFIG);
    set_override("TEMPERATURE", "very hot");
    set_override("MAX_TOKENS", "-5");
    set_override("MAX_ITERATIONS", "0");
    set_override("MCP_MODE", "carrier-pigeon");

    let config = AppConfig::load(Some(&path)).expect("load");
    clear_overrides();

    assert_eq!(config.model.temperature, 0.7);
    assert_eq!(config.model.max_tokens, 512);
    assert_eq!(config.agent.max_iterations, 8);
    assert_eq!(config.transport.kind, TransportKind::LocalPipe);
}

#[test]
#[serial]
fn script_path_override_applies_to_local_pipe_only() {
    clear_overrides();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[transport]\nkind = \"http-stream\"\n");
    set_override("SERVER_SCRIPT_PATH", "other/server.py");

    let config = AppConfig::load(Some(&path)).expect("load");
    clear_overrides();

    assert_eq!(config.transport.kind, TransportKind::HttpStream);
    assert_eq!(config.transport.target, "http://localhost:8000/mcp");
}
