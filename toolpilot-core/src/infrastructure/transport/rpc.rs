//! JSON-RPC framing shared by the transports.

use super::error::TransportError;
use super::protocol::{
    self, CallToolResult, JSONRPC_VERSION, ListToolsResult, METHOD_CALL_TOOL, METHOD_INITIALIZE,
    METHOD_INITIALIZED, METHOD_LIST_TOOLS,
};
use crate::domain::types::ToolDescriptor;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::debug;

/// A channel that can carry JSON-RPC requests and notifications to one server.
#[async_trait]
pub trait RpcChannel: Send + Sync {
    fn server(&self) -> &str;

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError>;

    async fn notify(&self, method: &str, params: Value) -> Result<(), TransportError>;
}

/// `initialize` followed by `notifications/initialized`.
pub async fn handshake(channel: &dyn RpcChannel) -> Result<Value, TransportError> {
    let result = channel
        .request(METHOD_INITIALIZE, protocol::initialize_params())
        .await?;
    channel.notify(METHOD_INITIALIZED, json!({})).await?;
    Ok(result)
}

/// Every tool the server advertises, following `nextCursor` pages.
pub async fn fetch_tools(channel: &dyn RpcChannel) -> Result<Vec<ToolDescriptor>, TransportError> {
    let mut tools = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let result = channel
            .request(
                METHOD_LIST_TOOLS,
                protocol::list_tools_params(cursor.as_deref()),
            )
            .await?;
        let page: ListToolsResult =
            serde_json::from_value(result).map_err(|source| TransportError::InvalidJson {
                server: channel.server().to_string(),
                source,
            })?;
        tools.extend(page.tools.into_iter().map(ToolDescriptor::from));
        match page.next_cursor {
            Some(next) if !next.is_empty() && cursor.as_deref() != Some(next.as_str()) => {
                cursor = Some(next)
            }
            _ => break,
        }
    }
    Ok(tools)
}

pub async fn invoke_tool(
    channel: &dyn RpcChannel,
    tool: &str,
    arguments: Value,
) -> Result<CallToolResult, TransportError> {
    let result = channel
        .request(METHOD_CALL_TOOL, protocol::call_tool_params(tool, arguments))
        .await?;
    serde_json::from_value(result).map_err(|source| TransportError::InvalidJson {
        server: channel.server().to_string(),
        source,
    })
}

pub type Responder = oneshot::Sender<Result<Value, TransportError>>;

/// In-flight requests awaiting a response, keyed by request id.
pub struct PendingRequests {
    server: String,
    waiting: AsyncMutex<HashMap<String, Responder>>,
    id_counter: AtomicU64,
}

impl PendingRequests {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            waiting: AsyncMutex::new(HashMap::new()),
            id_counter: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }

    pub async fn register(&self, id: &str) -> oneshot::Receiver<Result<Value, TransportError>> {
        let (tx, rx) = oneshot::channel();
        self.waiting.lock().await.insert(id.to_string(), tx);
        rx
    }

    pub async fn forget(&self, id: &str) {
        self.waiting.lock().await.remove(id);
    }

    /// Route a response message to whoever is waiting for it.
    pub async fn resolve(&self, message: Value) {
        let Some(key) = message.get("id").and_then(response_key) else {
            return;
        };
        let responder = self.waiting.lock().await.remove(&key);
        match responder {
            Some(sender) => {
                let _ = sender.send(into_result(&self.server, message));
            }
            None => debug!(
                server = %self.server,
                response_id = %key,
                "received response for unknown request"
            ),
        }
    }

    /// Fail every waiting request with an error built by `error`.
    pub async fn fail_all(&self, error: impl Fn() -> TransportError) {
        let mut waiting = self.waiting.lock().await;
        for (_, sender) in waiting.drain() {
            let _ = sender.send(Err(error()));
        }
    }

    pub async fn len(&self) -> usize {
        self.waiting.lock().await.len()
    }

    /// Wait for the response to `id`, giving up after `timeout`.
    pub async fn wait(
        &self,
        id: &str,
        rx: oneshot::Receiver<Result<Value, TransportError>>,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::Terminated {
                server: self.server.clone(),
            }),
            Err(_) => {
                self.forget(id).await;
                Err(TransportError::Timeout {
                    server: self.server.clone(),
                    seconds: timeout.as_secs(),
                })
            }
        }
    }
}

/// Inbound message classification.
pub enum Inbound {
    Response(Value),
    Request { id: Value, method: String },
    Notification { method: String },
    Unknown,
}

pub fn classify(message: Value) -> Inbound {
    let method = message
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_string);
    match (message.get("id").cloned(), method) {
        (Some(id), Some(method)) => Inbound::Request { id, method },
        (Some(_), None) => Inbound::Response(message),
        (None, Some(method)) => Inbound::Notification { method },
        (None, None) => Inbound::Unknown,
    }
}

pub fn request(id: &str, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "method": method,
        "params": params
    })
}

pub fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": params
    })
}

pub fn response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result
    })
}

pub fn error_response(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": { "code": code, "message": message.into() }
    })
}

/// Turn a response message into its `result`, or the JSON-RPC error it carries.
pub fn into_result(server: &str, mut message: Value) -> Result<Value, TransportError> {
    if let Some(error) = message.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32000);
        let text = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(TransportError::Rpc {
            server: server.to_string(),
            code,
            message: text,
        });
    }
    Ok(message
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

pub fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}
