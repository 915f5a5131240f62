use crate::constants::{DEFAULT_SERVER_NAME, DEFAULT_TOOL_TIMEOUT_SECS, DEFAULT_TOOL_URL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Wire binding used to reach the tool server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Subprocess speaking newline-delimited JSON-RPC on stdin/stdout.
    #[serde(alias = "stdio")]
    LocalPipe,
    /// MCP streamable HTTP.
    #[default]
    #[serde(alias = "streamable_http", alias = "streamable-http")]
    HttpStream,
    /// MCP over server-sent events.
    #[serde(alias = "sse")]
    EventStream,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::LocalPipe => "local-pipe",
            TransportKind::HttpStream => "http-stream",
            TransportKind::EventStream => "event-stream",
        }
    }

    pub fn is_http(self) -> bool {
        !matches!(self, TransportKind::LocalPipe)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local-pipe" | "local_pipe" | "stdio" => Ok(TransportKind::LocalPipe),
            "http-stream" | "http_stream" | "streamable_http" | "streamable-http" => {
                Ok(TransportKind::HttpStream)
            }
            "event-stream" | "event_stream" | "sse" => Ok(TransportKind::EventStream),
            other => Err(format!("unknown transport kind '{other}'")),
        }
    }
}

/// How to reach the tool server.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub name: String,
    pub kind: TransportKind,
    /// Script or executable path for local-pipe, URL otherwise.
    pub target: String,
    /// Interpreter override for local-pipe.
    pub command: Option<String>,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
    /// Extra request headers for the HTTP bindings.
    pub headers: HashMap<String, String>,
    pub request_timeout: Duration,
}

impl TransportConfig {
    pub fn new(kind: TransportKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn local_pipe(target: impl Into<String>) -> Self {
        Self::new(TransportKind::LocalPipe, target)
    }

    pub fn http_stream(url: impl Into<String>) -> Self {
        Self::new(TransportKind::HttpStream, url)
    }

    pub fn event_stream(url: impl Into<String>) -> Self {
        Self::new(TransportKind::EventStream, url)
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            kind: TransportKind::default(),
            target: DEFAULT_TOOL_URL.to_string(),
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
            headers: HashMap::new(),
            request_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        }
    }
}
