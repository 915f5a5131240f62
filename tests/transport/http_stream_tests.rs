// Streamable-HTTP transport tests against an axum mock server.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use toolpilot_core::transport::http_stream::{HttpEndpoint, HttpSubSession};
use toolpilot_core::transport::{ToolServer, Transport, TransportConfig, TransportError, TransportKind};
use toolpilot_tests::mock::http_stream::HttpStreamMock;

async fn connect(mock: &HttpStreamMock) -> Transport {
    let config = TransportConfig::http_stream(&mock.url).with_timeout(Duration::from_secs(10));
    Transport::connect(&config, &reqwest::Client::new())
        .await
        .expect("connect to mock server")
}

#[tokio::test]
async fn connect_probes_and_releases_a_session() {
    let mock = HttpStreamMock::start().await;

    let transport = connect(&mock).await;

    assert_eq!(transport.kind(), TransportKind::HttpStream);
    assert_eq!(mock.initialized(), 1);
    assert_eq!(mock.released(), 1);
    assert_eq!(mock.open_sessions(), 0);
}

#[tokio::test]
async fn every_operation_runs_in_its_own_session() {
    let mock = HttpStreamMock::start().await;
    let transport = connect(&mock).await;

    let tools = transport.list_tools().await.expect("list tools");
    assert_eq!(tools.len(), 5);

    let result = transport
        .call_tool("add", json!({"a": 20, "b": 22}))
        .await
        .expect("call add");
    assert_eq!(result.payload(), Some(&json!(42)));

    assert_eq!(mock.initialized(), 3);
    assert_eq!(mock.released(), 3);
    assert_eq!(mock.open_sessions(), 0);
    transport.close().await;
}

#[tokio::test]
async fn event_stream_response_skips_unrelated_events() {
    let mock = HttpStreamMock::start().await;
    let transport = connect(&mock).await;

    // tools/call answers arrive as an event stream led by a progress notification.
    let result = transport
        .call_tool("get_weather", json!({"city": "Oslo"}))
        .await
        .expect("call get_weather");
    assert_eq!(result.text().as_deref(), Some("Sunny in Oslo"));

    transport.close().await;
}

#[tokio::test]
async fn rpc_error_is_recoverable() {
    let mock = HttpStreamMock::start().await;
    let transport = connect(&mock).await;

    let err = transport
        .call_tool("fail", json!({}))
        .await
        .expect_err("fail tool errors");
    assert!(matches!(err, TransportError::Rpc { .. }));
    assert!(!err.is_fatal());
    assert_eq!(mock.open_sessions(), 0);

    transport.close().await;
}

#[tokio::test]
async fn server_error_status_is_fatal() {
    let mock = HttpStreamMock::start().await;
    let transport = connect(&mock).await;

    let err = transport
        .call_tool("crash", json!({}))
        .await
        .expect_err("server answers 500");
    assert!(matches!(err, TransportError::Http { status: 500, .. }));
    assert!(err.is_fatal());

    transport.close().await;
}

#[tokio::test]
async fn closed_session_rejects_operations() {
    let mock = HttpStreamMock::start().await;
    let transport = connect(&mock).await;

    transport.close().await;
    transport.close().await;

    let err = transport.list_tools().await.expect_err("closed");
    assert!(matches!(err, TransportError::Closed { .. }));
}

#[tokio::test]
async fn wrong_path_fails_the_handshake() {
    let mock = HttpStreamMock::start().await;
    let url = mock.url.replace("/mcp", "/nope");
    let config = TransportConfig::http_stream(url);

    let err = Transport::connect(&config, &reqwest::Client::new())
        .await
        .err()
        .expect("404");
    assert!(matches!(err, TransportError::Http { status: 404, .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn dropped_sub_session_is_released_in_the_background() {
    let mock = HttpStreamMock::start().await;
    let endpoint = Arc::new(
        HttpEndpoint::new(&TransportConfig::http_stream(&mock.url), reqwest::Client::new())
            .expect("endpoint"),
    );

    let session = HttpSubSession::acquire(&endpoint).await.expect("acquire");
    assert_eq!(session.session_id(), Some("session-1"));
    assert_eq!(mock.open_sessions(), 1);

    drop(session);
    for _ in 0..50 {
        if mock.open_sessions() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(mock.open_sessions(), 0);
    assert_eq!(mock.released(), 1);
}
