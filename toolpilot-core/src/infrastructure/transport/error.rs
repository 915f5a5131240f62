use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to spawn tool server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server '{server}' has an invalid target: {message}")]
    InvalidTarget { server: String, message: String },
    #[error("failed to connect to tool server '{server}': {message}")]
    Connect { server: String, message: String },
    #[error("tool server '{server}' answered HTTP {status}: {body}")]
    Http {
        server: String,
        status: u16,
        body: String,
    },
    #[error("tool server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("tool server '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("tool server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("tool server '{server}' handshake failed: {message}")]
    Handshake { server: String, message: String },
    #[error("tool server '{server}' terminated unexpectedly")]
    Terminated { server: String },
    #[error("tool server '{server}' did not answer within {seconds}s")]
    Timeout { server: String, seconds: u64 },
    #[error("session with tool server '{server}' is closed")]
    Closed { server: String },
}

impl TransportError {
    pub fn transport(server: &str, message: impl Into<String>) -> Self {
        TransportError::Transport {
            server: server.to_string(),
            message: message.into(),
        }
    }

    pub fn closed(server: &str) -> Self {
        TransportError::Closed {
            server: server.to_string(),
        }
    }

    /// Whether the session is unusable after this error.
    ///
    /// JSON-RPC errors and timeouts concern a single call; the loop turns them
    /// into error turns. Everything else aborts the query.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            TransportError::Rpc { .. } | TransportError::Timeout { .. }
        )
    }

    pub fn server(&self) -> &str {
        match self {
            TransportError::Spawn { server, .. }
            | TransportError::InvalidTarget { server, .. }
            | TransportError::Connect { server, .. }
            | TransportError::Http { server, .. }
            | TransportError::Transport { server, .. }
            | TransportError::InvalidJson { server, .. }
            | TransportError::Rpc { server, .. }
            | TransportError::Handshake { server, .. }
            | TransportError::Terminated { server }
            | TransportError::Timeout { server, .. }
            | TransportError::Closed { server } => server,
        }
    }

    /// Re-label a failure that happened while opening the session.
    pub(crate) fn into_handshake(self) -> Self {
        match self {
            TransportError::Rpc {
                server,
                code,
                message,
            } => TransportError::Handshake {
                server,
                message: format!("JSON-RPC error {code}: {message}"),
            },
            TransportError::Timeout { server, seconds } => TransportError::Handshake {
                server,
                message: format!("no answer within {seconds}s"),
            },
            TransportError::InvalidJson { server, source } => TransportError::Handshake {
                server,
                message: source.to_string(),
            },
            other => other,
        }
    }
}
