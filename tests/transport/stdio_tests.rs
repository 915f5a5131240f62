// Local-pipe transport tests against the mock-tool-server binary.

use serde_json::json;
use std::time::Duration;
use toolpilot_core::transport::{ToolServer, Transport, TransportConfig, TransportError, TransportKind};

fn mock_server() -> TransportConfig {
    TransportConfig::local_pipe(env!("CARGO_BIN_EXE_mock-tool-server"))
        .with_timeout(Duration::from_secs(10))
}

async fn connect() -> Transport {
    Transport::connect(&mock_server(), &reqwest::Client::new())
        .await
        .expect("connect to mock server")
}

#[tokio::test]
async fn lists_every_page_of_tools() {
    let transport = connect().await;
    assert_eq!(transport.kind(), TransportKind::LocalPipe);

    let tools = transport.list_tools().await.expect("list tools");
    let names = tools.iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["add", "get_weather", "fail", "crash", "stall"]);
    assert!(tools[0].input_schema.is_some());

    transport.close().await;
}

#[tokio::test]
async fn calls_tool_with_structured_result() {
    let transport = connect().await;

    let result = transport
        .call_tool("add", json!({"a": 2, "b": 3}))
        .await
        .expect("call add");
    assert!(!result.is_error);
    assert_eq!(result.payload(), Some(&json!(5)));
    assert_eq!(result.text().as_deref(), Some("5"));

    transport.close().await;
}

#[tokio::test]
async fn answers_server_ping_and_keeps_going() {
    let transport = connect().await;

    // The mock pings the client before its first tools/list reply.
    transport.list_tools().await.expect("list tools");
    let result = transport
        .call_tool("get_weather", json!({"city": "Jakarta"}))
        .await
        .expect("call get_weather");
    assert_eq!(result.text().as_deref(), Some("Sunny in Jakarta"));
    assert_eq!(result.payload(), None);

    transport.close().await;
}

#[tokio::test]
async fn rpc_error_is_not_fatal() {
    let transport = connect().await;

    let err = transport
        .call_tool("fail", json!({}))
        .await
        .expect_err("fail tool errors");
    assert!(matches!(err, TransportError::Rpc { code: -32000, .. }));
    assert!(!err.is_fatal());

    let result = transport
        .call_tool("add", json!({"a": 1, "b": 1}))
        .await
        .expect("session still usable");
    assert_eq!(result.payload(), Some(&json!(2)));

    transport.close().await;
}

#[tokio::test]
async fn crashed_server_fails_pending_call() {
    let transport = connect().await;

    let err = transport
        .call_tool("crash", json!({}))
        .await
        .expect_err("server exits");
    assert!(matches!(err, TransportError::Terminated { .. }));
    assert!(err.is_fatal());

    let err = transport
        .call_tool("add", json!({"a": 1, "b": 1}))
        .await
        .expect_err("no server left");
    assert!(err.is_fatal());

    transport.close().await;
}

#[tokio::test]
async fn close_is_idempotent() {
    let transport = connect().await;

    transport.close().await;
    transport.close().await;
    assert!(transport.is_closed());

    let err = transport.list_tools().await.expect_err("closed");
    assert!(matches!(err, TransportError::Closed { .. }));
}

#[tokio::test]
async fn missing_executable_is_a_spawn_error() {
    let config = TransportConfig::local_pipe("/definitely/not/here/server-bin");
    let err = Transport::connect(&config, &reqwest::Client::new())
        .await
        .err()
        .expect("spawn fails");
    assert!(matches!(err, TransportError::Spawn { .. }));
}
