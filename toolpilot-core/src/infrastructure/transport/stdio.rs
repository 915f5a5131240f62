//! Local-pipe binding: a subprocess speaking newline-delimited JSON-RPC.

use super::error::TransportError;
use super::protocol::METHOD_PING;
use super::rpc::{self, Inbound, PendingRequests, RpcChannel};
use crate::config::TransportConfig;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long a server gets to exit on its own once stdin is closed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

type SharedWriter = Arc<AsyncMutex<Option<BufWriter<ChildStdin>>>>;

pub struct StdioTransport {
    server: String,
    child: AsyncMutex<Option<Child>>,
    writer: SharedWriter,
    pending: Arc<PendingRequests>,
    reader: JoinHandle<()>,
    alive: Arc<AtomicBool>,
    closed: AtomicBool,
    timeout: Duration,
}

/// Program and arguments used to launch `config.target`.
///
/// An explicit `command` wins; otherwise `.py` runs under `python`,
/// `.js`/`.mjs`/`.cjs` under `node`, and anything else is executed directly.
pub fn launch_command(config: &TransportConfig) -> Result<(String, Vec<String>), TransportError> {
    let target = config.target.trim();
    if let Some(command) = config.command.as_deref().filter(|c| !c.trim().is_empty()) {
        let mut args = Vec::with_capacity(config.args.len() + 1);
        if !target.is_empty() {
            args.push(target.to_string());
        }
        args.extend(config.args.iter().cloned());
        return Ok((command.to_string(), args));
    }

    if target.is_empty() {
        return Err(TransportError::InvalidTarget {
            server: config.name.clone(),
            message: "no server script or executable configured".into(),
        });
    }

    let extension = Path::new(target)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let interpreter = match extension.as_deref() {
        Some("py") => Some("python"),
        Some("js" | "mjs" | "cjs") => Some("node"),
        _ => None,
    };

    Ok(match interpreter {
        Some(program) => {
            let mut args = vec![target.to_string()];
            args.extend(config.args.iter().cloned());
            (program.to_string(), args)
        }
        None => (target.to_string(), config.args.clone()),
    })
}

impl StdioTransport {
    /// Spawn the server and complete the MCP handshake.
    pub async fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let (program, args) = launch_command(config)?;

        let mut command = Command::new(&program);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &config.workdir {
            command.current_dir(dir);
        }
        for (key, value) in &config.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| TransportError::Spawn {
            server: config.name.clone(),
            source,
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::transport(&config.name, "failed to capture server stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| {
            TransportError::transport(&config.name, "failed to capture server stdout")
        })?;

        let writer: SharedWriter = Arc::new(AsyncMutex::new(Some(BufWriter::new(stdin))));
        let pending = Arc::new(PendingRequests::new(&config.name));
        let alive = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(reader_loop(
            config.name.clone(),
            stdout,
            Arc::clone(&writer),
            Arc::clone(&pending),
            Arc::clone(&alive),
        ));

        let transport = Self {
            server: config.name.clone(),
            child: AsyncMutex::new(Some(child)),
            writer,
            pending,
            reader,
            alive,
            closed: AtomicBool::new(false),
            timeout: config.request_timeout,
        };

        if let Err(err) = rpc::handshake(&transport).await {
            transport.close().await;
            return Err(err.into_handshake());
        }

        info!(server = %transport.server, program = %program, "Tool server process started");
        Ok(transport)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_usable(&self) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::closed(&self.server));
        }
        if !self.alive.load(Ordering::SeqCst) {
            return Err(TransportError::Terminated {
                server: self.server.clone(),
            });
        }
        Ok(())
    }

    /// Idempotent. Closes stdin, lets the child exit, kills it if it lingers.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.writer.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
                Ok(Ok(status)) => debug!(server = %self.server, %status, "Tool server exited"),
                Ok(Err(err)) => debug!(server = %self.server, %err, "Failed to reap tool server"),
                Err(_) => {
                    if let Err(err) = child.kill().await {
                        debug!(
                            server = %self.server,
                            %err,
                            "failed to kill tool server process (may have already exited)"
                        );
                    }
                }
            }
        }

        self.reader.abort();
        let server = self.server.clone();
        self.pending
            .fail_all(|| TransportError::closed(&server))
            .await;
        info!(server = %self.server, "Tool server session closed");
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        // The child itself is killed through `kill_on_drop`.
        self.reader.abort();
    }
}

#[async_trait]
impl RpcChannel for StdioTransport {
    fn server(&self) -> &str {
        &self.server
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        self.ensure_usable()?;
        let id = self.pending.next_id();
        let rx = self.pending.register(&id).await;
        // The reader may have drained the table between the check and the insert.
        if !self.alive.load(Ordering::SeqCst) {
            self.pending.forget(&id).await;
            return Err(TransportError::Terminated {
                server: self.server.clone(),
            });
        }

        let message = rpc::request(&id, method, params);
        if let Err(err) = write_message(&self.server, &self.writer, &message).await {
            self.pending.forget(&id).await;
            return Err(err);
        }
        debug!(server = %self.server, method, id = %id, "Sent request");
        self.pending.wait(&id, rx, self.timeout).await
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), TransportError> {
        self.ensure_usable()?;
        write_message(&self.server, &self.writer, &rpc::notification(method, params)).await
    }
}

async fn write_message(
    server: &str,
    writer: &SharedWriter,
    message: &Value,
) -> Result<(), TransportError> {
    let mut encoded =
        serde_json::to_string(message).map_err(|source| TransportError::InvalidJson {
            server: server.to_string(),
            source,
        })?;
    encoded.push('\n');

    let mut writer = writer.lock().await;
    let stream = writer
        .as_mut()
        .ok_or_else(|| TransportError::closed(server))?;
    stream
        .write_all(encoded.as_bytes())
        .await
        .map_err(|source| TransportError::transport(server, source.to_string()))?;
    stream
        .flush()
        .await
        .map_err(|source| TransportError::transport(server, source.to_string()))
}

async fn reader_loop(
    server: String,
    stdout: ChildStdout,
    writer: SharedWriter,
    pending: Arc<PendingRequests>,
    alive: Arc<AtomicBool>,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let raw = match lines.next_line().await {
            Ok(Some(raw)) => raw,
            Ok(None) => break,
            Err(err) => {
                warn!(server = %server, %err, "failed to read from tool server");
                break;
            }
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('\u{1b}') {
            debug!(server = %server, line = trimmed, "skipping ANSI log line from tool server");
            continue;
        }
        let message = match serde_json::from_str::<Value>(trimmed) {
            Ok(message) => message,
            Err(source) => {
                warn!(server = %server, line = trimmed, %source, "received invalid JSON from tool server");
                continue;
            }
        };

        match rpc::classify(message) {
            Inbound::Response(message) => pending.resolve(message).await,
            Inbound::Request { id, method } => {
                let reply = if method == METHOD_PING {
                    rpc::response(id, json!({}))
                } else {
                    warn!(server = %server, method = %method, "server sent unsupported request");
                    rpc::error_response(
                        id,
                        super::protocol::METHOD_NOT_FOUND,
                        format!("client does not implement method '{method}'"),
                    )
                };
                if let Err(err) = write_message(&server, &writer, &reply).await {
                    warn!(server = %server, %err, "failed to answer server request");
                }
            }
            Inbound::Notification { method } => {
                debug!(server = %server, method = %method, "received notification from server");
            }
            Inbound::Unknown => {}
        }
    }

    alive.store(false, Ordering::SeqCst);
    pending
        .fail_all(|| TransportError::Terminated {
            server: server.clone(),
        })
        .await;
    debug!(server = %server, "tool server output closed");
}
