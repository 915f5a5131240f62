// SSE transport tests against an axum mock server.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use toolpilot_core::transport::event_stream::{SseEndpoint, SseSubSession};
use toolpilot_core::transport::{ToolServer, Transport, TransportConfig, TransportError, TransportKind};
use toolpilot_tests::mock::event_stream::EventStreamMock;

async fn connect(mock: &EventStreamMock) -> Transport {
    let config = TransportConfig::event_stream(&mock.url).with_timeout(Duration::from_secs(10));
    Transport::connect(&config, &reqwest::Client::new())
        .await
        .expect("connect to mock server")
}

#[tokio::test]
async fn lists_tools_over_the_announced_endpoint() {
    let mock = EventStreamMock::start().await;
    let transport = connect(&mock).await;
    assert_eq!(transport.kind(), TransportKind::EventStream);

    let tools = transport.list_tools().await.expect("list tools");
    let names = tools.iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["add", "get_weather", "fail", "crash", "stall"]);

    // One stream for the connect probe, one for the listing.
    assert_eq!(mock.opened(), 2);
    transport.close().await;
}

#[tokio::test]
async fn answers_server_ping() {
    let mock = EventStreamMock::start().await;
    let transport = connect(&mock).await;

    transport.list_tools().await.expect("list tools");

    // The pong is posted by the reader task; give it a moment.
    for _ in 0..50 {
        if mock.pings_answered() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(mock.pings_answered() >= 1);
    transport.close().await;
}

#[tokio::test]
async fn calls_tool_with_structured_result() {
    let mock = EventStreamMock::start().await;
    let transport = connect(&mock).await;

    let result = transport
        .call_tool("add", json!({"a": 2, "b": 2}))
        .await
        .expect("call add");
    assert_eq!(result.payload(), Some(&json!(4)));

    transport.close().await;
}

#[tokio::test]
async fn rpc_error_is_recoverable() {
    let mock = EventStreamMock::start().await;
    let transport = connect(&mock).await;

    let err = transport
        .call_tool("fail", json!({}))
        .await
        .expect_err("fail tool errors");
    assert!(!err.is_fatal());

    transport.close().await;
}

#[tokio::test]
async fn ended_stream_terminates_the_call() {
    let mock = EventStreamMock::start().await;
    let transport = connect(&mock).await;

    let err = transport
        .call_tool("crash", json!({}))
        .await
        .expect_err("stream ends");
    assert!(matches!(err, TransportError::Terminated { .. }));
    assert!(err.is_fatal());

    transport.close().await;
}

#[tokio::test]
async fn unknown_path_is_fatal() {
    let mock = EventStreamMock::start().await;
    let config = TransportConfig::event_stream(mock.url.replace("/sse", "/missing"));

    let err = Transport::connect(&config, &reqwest::Client::new())
        .await
        .err()
        .expect("404");
    assert!(err.is_fatal());
}

#[tokio::test]
async fn posts_to_the_endpoint_resolved_against_the_stream_url() {
    let mock = EventStreamMock::start().await;
    let config = TransportConfig::event_stream(&mock.url).with_timeout(Duration::from_secs(10));
    let endpoint = Arc::new(SseEndpoint::new(&config, reqwest::Client::new()).expect("endpoint"));

    let session = SseSubSession::acquire(&endpoint).await.expect("acquire");

    let expected = mock.url.replace("/sse", "/messages?session_id=stream-1");
    assert_eq!(session.post_url().as_str(), expected);
    session.release().await;
}
