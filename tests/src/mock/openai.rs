//! Scripted chat-completions endpoint.

use crate::spawn_app;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct OpenAiState {
    replies: VecDeque<Value>,
    requests: Vec<RecordedRequest>,
}

pub struct OpenAiMock {
    /// Base endpoint, without the API path.
    pub endpoint: String,
    state: Arc<Mutex<OpenAiState>>,
}

impl OpenAiMock {
    pub async fn start(replies: Vec<Value>) -> Self {
        let state = Arc::new(Mutex::new(OpenAiState {
            replies: replies.into(),
            requests: Vec::new(),
        }));
        let app = Router::new()
            .route("/v1/chat/completions", post(on_completion))
            .with_state(state.clone());
        let addr = spawn_app(app).await;
        Self {
            endpoint: format!("http://{addr}"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

/// A completion carrying final text.
pub fn text_completion(text: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

/// A completion requesting one tool call.
pub fn tool_call_completion(name: &str, arguments: Value) -> Value {
    json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

async fn on_completion(
    State(state): State<Arc<Mutex<OpenAiState>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    });
    match state.replies.pop_front() {
        Some(reply) => Json(reply).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "script exhausted").into_response(),
    }
}
