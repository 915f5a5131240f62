//! SSE mock: `GET /sse` announces a per-stream POST endpoint, answers arrive
//! on the stream as `message` events.

use super::tools::{Reply, handle};
use crate::spawn_app;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;

#[derive(Default)]
pub struct EventStreamState {
    next_stream: usize,
    streams: HashMap<String, UnboundedSender<Value>>,
    opened: usize,
    pings_answered: usize,
}

pub struct EventStreamMock {
    pub url: String,
    state: Arc<Mutex<EventStreamState>>,
}

impl EventStreamMock {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(EventStreamState::default()));
        let app = Router::new()
            .route("/sse", get(on_stream))
            .route("/messages", post(on_message))
            .with_state(state.clone());
        let addr = spawn_app(app).await;
        Self {
            url: format!("http://{addr}/sse"),
            state,
        }
    }

    /// Event streams opened so far.
    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    /// Server pings the client has answered.
    pub fn pings_answered(&self) -> usize {
        self.state.lock().unwrap().pings_answered
    }
}

type Shared = Arc<Mutex<EventStreamState>>;

async fn on_stream(State(state): State<Shared>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel::<Value>();
    let id = {
        let mut state = state.lock().unwrap();
        state.next_stream += 1;
        state.opened += 1;
        let id = format!("stream-{}", state.next_stream);
        state.streams.insert(id.clone(), tx);
        id
    };

    let endpoint = stream::once(async move {
        Ok(Event::default()
            .event("endpoint")
            .data(format!("/messages?session_id={id}")))
    });
    let messages = UnboundedReceiverStream::new(rx)
        .map(|message| Ok(Event::default().event("message").data(message.to_string())));
    Sse::new(endpoint.chain(messages))
}

async fn on_message(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> StatusCode {
    let Some(id) = params.get("session_id") else {
        return StatusCode::BAD_REQUEST;
    };
    let mut state = state.lock().unwrap();
    let Some(tx) = state.streams.get(id).cloned() else {
        return StatusCode::NOT_FOUND;
    };

    if body.get("method").is_none() {
        if body.get("id").and_then(Value::as_str) == Some("srv-ping") {
            state.pings_answered += 1;
        }
        return StatusCode::ACCEPTED;
    }

    let method = body.get("method").and_then(Value::as_str).unwrap_or_default();
    match handle(&body) {
        Reply::Respond(reply) => {
            if method == "tools/list" {
                let _ = tx.send(json!({"jsonrpc": "2.0", "id": "srv-ping", "method": "ping"}));
            }
            let _ = tx.send(reply);
        }
        Reply::Silent | Reply::Stall => {}
        Reply::Crash => {
            // Dropping the only sender ends the event stream.
            state.streams.remove(id);
        }
    }
    StatusCode::ACCEPTED
}
