//! MCP server-sent-events binding.
//!
//! A `GET` opens the event stream; the server's first `endpoint` event names
//! the URL that requests are POSTed to. Responses come back on the stream as
//! `message` events.

use super::error::TransportError;
use super::http_stream::{header_map, request_error};
use super::protocol::{METHOD_NOT_FOUND, METHOD_PING};
use super::rpc::{self, Inbound, PendingRequests, RpcChannel};
use crate::config::TransportConfig;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap};
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource, retry::Never};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

const ENDPOINT_EVENT: &str = "endpoint";
const MESSAGE_EVENT: &str = "message";

/// Shared, immutable description of one SSE server.
pub struct SseEndpoint {
    server: String,
    url: Url,
    http: Client,
    headers: HeaderMap,
    timeout: Duration,
}

impl SseEndpoint {
    pub fn new(config: &TransportConfig, http: Client) -> Result<Self, TransportError> {
        let url = Url::parse(config.target.trim()).map_err(|err| TransportError::InvalidTarget {
            server: config.name.clone(),
            message: format!("'{}' is not a valid URL: {err}", config.target),
        })?;
        Ok(Self {
            server: config.name.clone(),
            url,
            http,
            headers: header_map(&config.name, &config.headers)?,
            timeout: config.request_timeout,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    async fn open_stream(&self) -> Result<(EventSource, Url), TransportError> {
        let request = self
            .http
            .get(self.url.clone())
            .headers(self.headers.clone())
            .header(ACCEPT, "text/event-stream");
        let mut source = EventSource::new(request).map_err(|err| TransportError::Connect {
            server: self.server.clone(),
            message: err.to_string(),
        })?;
        source.set_retry_policy(Box::new(Never));

        let wait = async {
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => continue,
                    Ok(Event::Message(message)) if message.event == ENDPOINT_EVENT => {
                        return self.resolve_endpoint(&message.data);
                    }
                    Ok(Event::Message(message)) => {
                        debug!(server = %self.server, event = %message.event, "event before endpoint");
                    }
                    Err(err) => return Err(self.stream_error(err)),
                }
            }
            Err(TransportError::Connect {
                server: self.server.clone(),
                message: "event stream closed before announcing an endpoint".into(),
            })
        };
        let post_url = match tokio::time::timeout(self.timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                server: self.server.clone(),
                seconds: self.timeout.as_secs(),
            }),
        };
        match post_url {
            Ok(post_url) => Ok((source, post_url)),
            Err(err) => {
                source.close();
                Err(err)
            }
        }
    }

    fn resolve_endpoint(&self, data: &str) -> Result<Url, TransportError> {
        self.url
            .join(data.trim())
            .map_err(|err| TransportError::Handshake {
                server: self.server.clone(),
                message: format!("invalid endpoint '{}': {err}", data.trim()),
            })
    }

    fn stream_error(&self, err: EventSourceError) -> TransportError {
        match err {
            EventSourceError::InvalidStatusCode(status, _) => TransportError::Http {
                server: self.server.clone(),
                status: status.as_u16(),
                body: String::new(),
            },
            EventSourceError::Transport(err) => request_error(&self.server, err),
            other => TransportError::Connect {
                server: self.server.clone(),
                message: other.to_string(),
            },
        }
    }

    async fn post(&self, post_url: &Url, message: &Value) -> Result<(), TransportError> {
        let response = self
            .http
            .post(post_url.clone())
            .headers(self.headers.clone())
            .json(message)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| request_error(&self.server, err))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                server: self.server.clone(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// One initialized MCP session riding on its own event stream.
pub struct SseSubSession {
    endpoint: Arc<SseEndpoint>,
    post_url: Url,
    pending: Arc<PendingRequests>,
    alive: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl SseSubSession {
    pub async fn acquire(endpoint: &Arc<SseEndpoint>) -> Result<Self, TransportError> {
        let (source, post_url) = endpoint
            .open_stream()
            .await
            .map_err(TransportError::into_handshake)?;
        let pending = Arc::new(PendingRequests::new(&endpoint.server));
        let alive = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(reader_loop(
            Arc::clone(endpoint),
            post_url.clone(),
            source,
            Arc::clone(&pending),
            Arc::clone(&alive),
        ));

        let session = Self {
            endpoint: Arc::clone(endpoint),
            post_url,
            pending,
            alive,
            reader,
        };
        rpc::handshake(&session)
            .await
            .map_err(TransportError::into_handshake)?;
        debug!(server = %endpoint.server, post_url = %session.post_url, "Acquired sub-session");
        Ok(session)
    }

    pub fn post_url(&self) -> &Url {
        &self.post_url
    }

    pub async fn release(self) {
        self.reader.abort();
        debug!(server = %self.endpoint.server, "Released sub-session");
    }
}

impl Drop for SseSubSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl RpcChannel for SseSubSession {
    fn server(&self) -> &str {
        &self.endpoint.server
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = self.pending.next_id();
        let rx = self.pending.register(&id).await;
        if !self.alive.load(Ordering::SeqCst) {
            self.pending.forget(&id).await;
            return Err(TransportError::Terminated {
                server: self.endpoint.server.clone(),
            });
        }

        let message = rpc::request(&id, method, params);
        if let Err(err) = self.endpoint.post(&self.post_url, &message).await {
            self.pending.forget(&id).await;
            return Err(err);
        }
        self.pending.wait(&id, rx, self.endpoint.timeout).await
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), TransportError> {
        self.endpoint
            .post(&self.post_url, &rpc::notification(method, params))
            .await
    }
}

async fn reader_loop(
    endpoint: Arc<SseEndpoint>,
    post_url: Url,
    mut source: EventSource,
    pending: Arc<PendingRequests>,
    alive: Arc<AtomicBool>,
) {
    let server = endpoint.server.clone();
    while let Some(event) = source.next().await {
        let message = match event {
            Ok(Event::Message(message))
                if message.event == MESSAGE_EVENT || message.event.is_empty() =>
            {
                message
            }
            Ok(_) => continue,
            Err(EventSourceError::StreamEnded) => break,
            Err(err) => {
                warn!(server = %server, %err, "tool server event stream failed");
                break;
            }
        };
        let value = match serde_json::from_str::<Value>(&message.data) {
            Ok(value) => value,
            Err(err) => {
                warn!(server = %server, %err, "received invalid JSON from tool server");
                continue;
            }
        };

        match rpc::classify(value) {
            Inbound::Response(value) => pending.resolve(value).await,
            Inbound::Request { id, method } => {
                let reply = if method == METHOD_PING {
                    rpc::response(id, json!({}))
                } else {
                    warn!(server = %server, method = %method, "server sent unsupported request");
                    rpc::error_response(
                        id,
                        METHOD_NOT_FOUND,
                        format!("client does not implement method '{method}'"),
                    )
                };
                if let Err(err) = endpoint.post(&post_url, &reply).await {
                    warn!(server = %server, %err, "failed to answer server request");
                }
            }
            Inbound::Notification { method } => {
                debug!(server = %server, method = %method, "received notification from server");
            }
            Inbound::Unknown => {}
        }
    }

    source.close();
    alive.store(false, Ordering::SeqCst);
    pending
        .fail_all(|| TransportError::Terminated {
            server: server.clone(),
        })
        .await;
}
