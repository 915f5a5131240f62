//! Streamable-HTTP mock: sessions handed out on `initialize`, `tools/call`
//! answered as an event stream, everything else as plain JSON.

use super::tools::{Reply, handle};
use crate::spawn_app;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const SESSION_HEADER: &str = "mcp-session-id";

#[derive(Default)]
pub struct HttpStreamState {
    next_session: usize,
    open: HashSet<String>,
    initialized: usize,
    released: usize,
}

pub struct HttpStreamMock {
    pub url: String,
    state: Arc<Mutex<HttpStreamState>>,
}

impl HttpStreamMock {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(HttpStreamState::default()));
        let app = Router::new()
            .route("/mcp", post(on_post).delete(on_delete))
            .with_state(state.clone());
        let addr = spawn_app(app).await;
        Self {
            url: format!("http://{addr}/mcp"),
            state,
        }
    }

    /// Sessions initialized so far.
    pub fn initialized(&self) -> usize {
        self.state.lock().unwrap().initialized
    }

    /// Sessions released through `DELETE`.
    pub fn released(&self) -> usize {
        self.state.lock().unwrap().released
    }

    pub fn open_sessions(&self) -> usize {
        self.state.lock().unwrap().open.len()
    }
}

type Shared = Arc<Mutex<HttpStreamState>>;

async fn on_post(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let method = body.get("method").and_then(Value::as_str).unwrap_or_default();
    if method == "initialize" {
        let session = {
            let mut state = state.lock().unwrap();
            state.next_session += 1;
            state.initialized += 1;
            let session = format!("session-{}", state.next_session);
            state.open.insert(session.clone());
            session
        };
        let Reply::Respond(reply) = handle(&body) else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        return ([(SESSION_HEADER, session)], Json(reply)).into_response();
    }

    let known = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|id| state.lock().unwrap().open.contains(id));
    if !known {
        return (StatusCode::NOT_FOUND, "unknown session").into_response();
    }

    match handle(&body) {
        Reply::Silent => StatusCode::ACCEPTED.into_response(),
        Reply::Crash => (StatusCode::INTERNAL_SERVER_ERROR, "tool server crashed").into_response(),
        Reply::Stall => std::future::pending::<Response>().await,
        Reply::Respond(reply) if method == "tools/call" => {
            let progress = json!({"jsonrpc": "2.0", "method": "notifications/progress", "params": {}});
            let body = format!("event: message\ndata: {progress}\n\nevent: message\ndata: {reply}\n\n");
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        Reply::Respond(reply) => Json(reply).into_response(),
    }
}

async fn on_delete(State(state): State<Shared>, headers: HeaderMap) -> StatusCode {
    let Some(id) = headers.get(SESSION_HEADER).and_then(|value| value.to_str().ok()) else {
        return StatusCode::BAD_REQUEST;
    };
    let mut state = state.lock().unwrap();
    if state.open.remove(id) {
        state.released += 1;
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}
