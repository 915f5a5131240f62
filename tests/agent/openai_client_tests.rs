// OpenAI-compatible client against a mock chat-completions endpoint.

use serde_json::json;
use toolpilot_core::config::ModelConfig;
use toolpilot_core::model::{ModelError, ModelProvider, OpenAiClient};
use toolpilot_core::types::ToolDescriptor;
use toolpilot_core::ToolCatalog;
use toolpilot_session::Turn;
use toolpilot_tests::mock::openai::{OpenAiMock, text_completion, tool_call_completion};

fn client(endpoint: &str) -> OpenAiClient {
    let config = ModelConfig {
        endpoint: endpoint.to_string(),
        model: "test-model".into(),
        ..ModelConfig::default()
    };
    OpenAiClient::with_api_key(&config, Some("sk-test".into()))
}

fn catalog() -> ToolCatalog {
    ToolCatalog::adapt(vec![
        ToolDescriptor::new("add")
            .with_description("Add two numbers")
            .with_schema(json!({"type": "object", "required": ["a", "b"]})),
    ])
}

#[tokio::test]
async fn sends_tools_and_parses_tool_calls() {
    let mock = OpenAiMock::start(vec![tool_call_completion("add", json!({"a": 1, "b": 2}))]).await;

    let reply = client(&mock.endpoint)
        .ask(&[Turn::user("1+2?")], &catalog())
        .await
        .expect("reply");

    assert!(!reply.has_text());
    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(reply.tool_calls[0].name, "add");
    assert_eq!(reply.tool_calls[0].id.as_deref(), Some("call_1"));
    let arguments: serde_json::Value =
        serde_json::from_str(&reply.tool_calls[0].arguments).expect("arguments json");
    assert_eq!(arguments, json!({"a": 1, "b": 2}));

    let body = &mock.requests()[0].body;
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["tool_choice"], "auto");
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "add");
    assert_eq!(body["messages"][0], json!({"role": "user", "content": "1+2?"}));
}

#[tokio::test]
async fn omits_tools_when_catalog_is_empty() {
    let mock = OpenAiMock::start(vec![text_completion("hi")]).await;

    let reply = client(&mock.endpoint)
        .ask(&[Turn::user("hello")], &ToolCatalog::default())
        .await
        .expect("reply");

    assert_eq!(reply.text, "hi");
    let body = &mock.requests()[0].body;
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
}

#[tokio::test]
async fn server_error_is_a_network_error() {
    let mock = OpenAiMock::start(vec![]).await;

    let err = client(&mock.endpoint)
        .ask(&[Turn::user("hello")], &catalog())
        .await
        .expect_err("500");

    assert!(matches!(err, ModelError::Network { .. }));
}

#[tokio::test]
async fn missing_choices_is_an_invalid_response() {
    let mock = OpenAiMock::start(vec![json!({"choices": []})]).await;

    let err = client(&mock.endpoint)
        .ask(&[Turn::user("hello")], &catalog())
        .await
        .expect_err("no message");

    assert!(matches!(err, ModelError::InvalidResponse { .. }));
}
