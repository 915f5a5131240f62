//! Wire bindings to the tool server.
//!
//! [`Transport`] is the single place that branches on [`TransportKind`]; the
//! rest of the crate only sees the [`ToolServer`] capability set.

mod connector;
mod error;
pub mod event_stream;
pub mod http_stream;
pub mod protocol;
pub mod rpc;
pub mod stdio;

pub use crate::config::{TransportConfig, TransportKind};
pub use connector::{ToolConnector, TransportConnector};
pub use error::TransportError;
pub use protocol::{CallToolResult, ToolContent};

use crate::domain::types::ToolDescriptor;
use async_trait::async_trait;
use event_stream::{SseEndpoint, SseSubSession};
use http_stream::{HttpEndpoint, HttpSubSession};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use stdio::StdioTransport;
use tracing::info;

/// An open session with a tool server.
#[async_trait]
pub trait ToolServer: Send + Sync {
    fn kind(&self) -> TransportKind;

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, TransportError>;

    async fn call_tool(&self, name: &str, arguments: Value)
    -> Result<CallToolResult, TransportError>;

    /// Release the session. Calling it again is a no-op.
    async fn close(&self);

    fn is_closed(&self) -> bool;
}

/// The three bindings, chosen once at connect time.
pub enum Transport {
    LocalPipe(StdioTransport),
    HttpStream(HttpStreamTransport),
    EventStream(EventStreamTransport),
}

impl Transport {
    /// Open a session of the configured kind.
    ///
    /// Connection failures surface immediately; nothing is retried here.
    pub async fn connect(
        config: &TransportConfig,
        http: &reqwest::Client,
    ) -> Result<Self, TransportError> {
        let transport = match config.kind {
            TransportKind::LocalPipe => Transport::LocalPipe(StdioTransport::connect(config).await?),
            TransportKind::HttpStream => {
                Transport::HttpStream(HttpStreamTransport::connect(config, http.clone()).await?)
            }
            TransportKind::EventStream => {
                Transport::EventStream(EventStreamTransport::connect(config, http.clone()).await?)
            }
        };
        info!(
            server = %config.name,
            kind = %config.kind,
            target = %config.target,
            "Connected to tool server"
        );
        Ok(transport)
    }
}

#[async_trait]
impl ToolServer for Transport {
    fn kind(&self) -> TransportKind {
        match self {
            Transport::LocalPipe(_) => TransportKind::LocalPipe,
            Transport::HttpStream(_) => TransportKind::HttpStream,
            Transport::EventStream(_) => TransportKind::EventStream,
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, TransportError> {
        match self {
            Transport::LocalPipe(inner) => rpc::fetch_tools(inner).await,
            Transport::HttpStream(inner) => inner.list_tools().await,
            Transport::EventStream(inner) => inner.list_tools().await,
        }
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, TransportError> {
        match self {
            Transport::LocalPipe(inner) => rpc::invoke_tool(inner, name, arguments).await,
            Transport::HttpStream(inner) => inner.call_tool(name, arguments).await,
            Transport::EventStream(inner) => inner.call_tool(name, arguments).await,
        }
    }

    async fn close(&self) {
        match self {
            Transport::LocalPipe(inner) => inner.close().await,
            Transport::HttpStream(inner) => inner.close(),
            Transport::EventStream(inner) => inner.close(),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Transport::LocalPipe(inner) => inner.is_closed(),
            Transport::HttpStream(inner) => inner.is_closed(),
            Transport::EventStream(inner) => inner.is_closed(),
        }
    }
}

/// Streamable-HTTP session: a sub-session per operation over a shared pool.
pub struct HttpStreamTransport {
    endpoint: Arc<HttpEndpoint>,
    closed: AtomicBool,
}

impl HttpStreamTransport {
    /// Validates the target and probes the server with one sub-session.
    pub async fn connect(
        config: &TransportConfig,
        http: reqwest::Client,
    ) -> Result<Self, TransportError> {
        let endpoint = Arc::new(HttpEndpoint::new(config, http)?);
        HttpSubSession::acquire(&endpoint).await?.release().await;
        Ok(Self {
            endpoint,
            closed: AtomicBool::new(false),
        })
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, TransportError> {
        self.ensure_open()?;
        let session = HttpSubSession::acquire(&self.endpoint).await?;
        let result = rpc::fetch_tools(&session).await;
        session.release().await;
        result
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, TransportError> {
        self.ensure_open()?;
        let session = HttpSubSession::acquire(&self.endpoint).await?;
        let result = rpc::invoke_tool(&session, name, arguments).await;
        session.release().await;
        result
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.is_closed() {
            Err(TransportError::closed(self.endpoint.server()))
        } else {
            Ok(())
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(server = %self.endpoint.server(), "Tool server session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// SSE session: an event stream per operation over a shared pool.
pub struct EventStreamTransport {
    endpoint: Arc<SseEndpoint>,
    closed: AtomicBool,
}

impl EventStreamTransport {
    pub async fn connect(
        config: &TransportConfig,
        http: reqwest::Client,
    ) -> Result<Self, TransportError> {
        let endpoint = Arc::new(SseEndpoint::new(config, http)?);
        SseSubSession::acquire(&endpoint).await?.release().await;
        Ok(Self {
            endpoint,
            closed: AtomicBool::new(false),
        })
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, TransportError> {
        self.ensure_open()?;
        let session = SseSubSession::acquire(&self.endpoint).await?;
        let result = rpc::fetch_tools(&session).await;
        session.release().await;
        result
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, TransportError> {
        self.ensure_open()?;
        let session = SseSubSession::acquire(&self.endpoint).await?;
        let result = rpc::invoke_tool(&session, name, arguments).await;
        session.release().await;
        result
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.is_closed() {
            Err(TransportError::closed(self.endpoint.server()))
        } else {
            Ok(())
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(server = %self.endpoint.server(), "Tool server session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
