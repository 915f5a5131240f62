//! MCP streamable-HTTP binding.
//!
//! Every operation runs in its own sub-session: `initialize` opens it (the
//! server hands out an `Mcp-Session-Id`), the operation runs, and a `DELETE`
//! releases it.

use super::error::TransportError;
use super::protocol::{METHOD_INITIALIZE, METHOD_INITIALIZED, initialize_params};
use super::rpc::{self, RpcChannel};
use crate::config::TransportConfig;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

pub const SESSION_HEADER: &str = "mcp-session-id";
const ACCEPT_BOTH: &str = "application/json, text/event-stream";

/// Shared, immutable description of one streamable-HTTP server.
pub struct HttpEndpoint {
    server: String,
    url: String,
    http: Client,
    headers: HeaderMap,
    timeout: Duration,
}

/// What came back from one POST.
struct HttpReply {
    session_id: Option<String>,
    message: Option<Value>,
}

impl HttpEndpoint {
    pub fn new(config: &TransportConfig, http: Client) -> Result<Self, TransportError> {
        let url = url::Url::parse(config.target.trim()).map_err(|err| {
            TransportError::InvalidTarget {
                server: config.name.clone(),
                message: format!("'{}' is not a valid URL: {err}", config.target),
            }
        })?;
        Ok(Self {
            server: config.name.clone(),
            url: url.to_string(),
            http,
            headers: header_map(&config.name, &config.headers)?,
            timeout: config.request_timeout,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    async fn exchange(
        &self,
        message: &Value,
        session_id: Option<&str>,
        expect_id: Option<&str>,
    ) -> Result<HttpReply, TransportError> {
        tokio::time::timeout(self.timeout, self.post(message, session_id, expect_id))
            .await
            .map_err(|_| TransportError::Timeout {
                server: self.server.clone(),
                seconds: self.timeout.as_secs(),
            })?
    }

    async fn post(
        &self,
        message: &Value,
        session_id: Option<&str>,
        expect_id: Option<&str>,
    ) -> Result<HttpReply, TransportError> {
        let mut request = self
            .http
            .post(&self.url)
            .headers(self.headers.clone())
            .header(ACCEPT, ACCEPT_BOTH)
            .json(message);
        if let Some(id) = session_id {
            request = request.header(SESSION_HEADER, id);
        }

        let response = request
            .send()
            .await
            .map_err(|err| request_error(&self.server, err))?;
        let status = response.status();
        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                server: self.server.clone(),
                status: status.as_u16(),
                body,
            });
        }
        if status == StatusCode::ACCEPTED || status == StatusCode::NO_CONTENT {
            return Ok(HttpReply {
                session_id,
                message: None,
            });
        }

        let is_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/event-stream"));

        let message = if is_stream {
            self.read_event_stream(response, expect_id).await?
        } else {
            let bytes = response
                .bytes()
                .await
                .map_err(|err| request_error(&self.server, err))?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                None
            } else {
                Some(serde_json::from_slice(&bytes).map_err(|source| {
                    TransportError::InvalidJson {
                        server: self.server.clone(),
                        source,
                    }
                })?)
            }
        };

        Ok(HttpReply {
            session_id,
            message,
        })
    }

    /// Pull events until the response to `expect_id` shows up.
    async fn read_event_stream(
        &self,
        response: reqwest::Response,
        expect_id: Option<&str>,
    ) -> Result<Option<Value>, TransportError> {
        let mut events = response.bytes_stream().eventsource();
        while let Some(event) = events.next().await {
            let event = event
                .map_err(|err| TransportError::transport(&self.server, err.to_string()))?;
            if event.data.trim().is_empty() {
                continue;
            }
            let message: Value = match serde_json::from_str(&event.data) {
                Ok(message) => message,
                Err(source) => {
                    warn!(server = %self.server, %source, "skipping malformed stream event");
                    continue;
                }
            };
            let matches = match (expect_id, message.get("id").and_then(rpc::response_key)) {
                (Some(expected), Some(id)) => expected == id && message.get("method").is_none(),
                (None, _) => true,
                _ => false,
            };
            if matches {
                return Ok(Some(message));
            }
            debug!(server = %self.server, "ignoring unrelated stream event");
        }
        match expect_id {
            Some(_) => Err(TransportError::transport(
                &self.server,
                "event stream ended before the response arrived",
            )),
            None => Ok(None),
        }
    }

    async fn delete_session(&self, session_id: &str) {
        let result = self
            .http
            .delete(&self.url)
            .headers(self.headers.clone())
            .header(SESSION_HEADER, session_id)
            .timeout(self.timeout)
            .send()
            .await;
        match result {
            Ok(response) if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
                debug!(server = %self.server, "server does not support session termination");
            }
            Ok(response) if !response.status().is_success() => {
                warn!(
                    server = %self.server,
                    status = response.status().as_u16(),
                    "failed to release tool server session"
                );
            }
            Ok(_) => debug!(server = %self.server, session_id, "Released sub-session"),
            Err(err) => warn!(server = %self.server, %err, "failed to release tool server session"),
        }
    }
}

/// One initialized MCP session on a streamable-HTTP server.
pub struct HttpSubSession {
    endpoint: Arc<HttpEndpoint>,
    session_id: Option<String>,
    id_counter: AtomicU64,
}

impl HttpSubSession {
    pub async fn acquire(endpoint: &Arc<HttpEndpoint>) -> Result<Self, TransportError> {
        let id = "req-1";
        let init = rpc::request(id, METHOD_INITIALIZE, initialize_params());
        let reply = endpoint
            .exchange(&init, None, Some(id))
            .await
            .map_err(TransportError::into_handshake)?;

        // From here on Drop takes care of the server-side session.
        let session = Self {
            endpoint: Arc::clone(endpoint),
            session_id: reply.session_id,
            id_counter: AtomicU64::new(2),
        };

        let message = reply.message.ok_or_else(|| TransportError::Handshake {
            server: endpoint.server.clone(),
            message: "empty initialize response".into(),
        })?;
        rpc::into_result(&endpoint.server, message).map_err(TransportError::into_handshake)?;
        session
            .notify(METHOD_INITIALIZED, json!({}))
            .await
            .map_err(TransportError::into_handshake)?;

        debug!(
            server = %endpoint.server,
            session_id = session.session_id.as_deref().unwrap_or("-"),
            "Acquired sub-session"
        );
        Ok(session)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub async fn release(mut self) {
        if let Some(id) = self.session_id.take() {
            self.endpoint.delete_session(&id).await;
        }
    }
}

impl Drop for HttpSubSession {
    fn drop(&mut self) {
        let Some(id) = self.session_id.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let endpoint = Arc::clone(&self.endpoint);
                handle.spawn(async move { endpoint.delete_session(&id).await });
            }
            Err(_) => debug!(
                server = %self.endpoint.server,
                "no runtime to release abandoned sub-session"
            ),
        }
    }
}

#[async_trait]
impl RpcChannel for HttpSubSession {
    fn server(&self) -> &str {
        &self.endpoint.server
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = format!("req-{}", self.id_counter.fetch_add(1, Ordering::SeqCst));
        let message = rpc::request(&id, method, params);
        let reply = self
            .endpoint
            .exchange(&message, self.session_id.as_deref(), Some(&id))
            .await?;
        let message = reply.message.ok_or_else(|| {
            TransportError::transport(&self.endpoint.server, format!("no response to '{method}'"))
        })?;
        rpc::into_result(&self.endpoint.server, message)
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), TransportError> {
        let message = rpc::notification(method, params);
        self.endpoint
            .exchange(&message, self.session_id.as_deref(), None)
            .await
            .map(|_| ())
    }
}

pub(crate) fn header_map(
    server: &str,
    headers: &std::collections::HashMap<String, String>,
) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let invalid = |message: String| TransportError::InvalidTarget {
            server: server.to_string(),
            message,
        };
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| invalid(format!("invalid header name '{name}': {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| invalid(format!("invalid value for header '{name}': {err}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

pub(crate) fn request_error(server: &str, err: reqwest::Error) -> TransportError {
    if err.is_connect() {
        TransportError::Connect {
            server: server.to_string(),
            message: err.to_string(),
        }
    } else {
        TransportError::transport(server, err.to_string())
    }
}
