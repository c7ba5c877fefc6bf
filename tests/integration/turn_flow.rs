//! Full turns against a mocked completion backend and an in-memory provider

use std::sync::Arc;

use mcp_chat_client::agent::NO_TOOL_FALLBACK;
use mcp_chat_client::{Error, McpAgent, MessageRole, TurnState};
use serde_json::json;

use crate::fake_provider::{args, FakeProvider, RecordedCall};
use crate::mock_server::{MockServerFixture, CHAT_PATH};

async fn agent_with(fixture: &MockServerFixture, provider: Arc<FakeProvider>) -> McpAgent {
    McpAgent::connect(provider, fixture.openai_client()).await
}

#[tokio::test]
async fn embedded_call_is_dispatched_and_followed_up() {
    let mut fixture = MockServerFixture::new().await;
    let first = fixture
        .mock_chat(
            "auto",
            json!({
                "role": "assistant",
                "content": "I will add them.\n{\"function_call\":{\"name\":\"add\",\"arguments\":{\"a\":2,\"b\":3}}}"
            }),
        )
        .await;
    let followup = fixture
        .mock_chat("none", json!({"role": "assistant", "content": "2 + 3 = 5."}))
        .await;

    let provider = Arc::new(FakeProvider::standard());
    let mut agent = agent_with(&fixture, provider.clone()).await;
    assert_eq!(agent.state(), TurnState::AwaitingUser);

    let answer = agent.process_query("add 2 and 3").await.unwrap();
    assert_eq!(answer, "2 + 3 = 5.");
    assert_eq!(agent.state(), TurnState::Done);
    assert_eq!(
        provider.calls(),
        vec![RecordedCall::CallTool("add".into(), args(json!({"a": 2, "b": 3})))]
    );

    let log = agent.conversation().messages();
    let roles: Vec<MessageRole> = log.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Function,
            MessageRole::Assistant
        ]
    );
    assert_eq!(log[1].function_call.as_ref().map(|c| c.name.as_str()), Some("add"));
    assert_eq!(log[2].name.as_deref(), Some("add"));
    assert_eq!(log[2].content_str(), "5");
    assert_eq!(log[3].content_str(), "2 + 3 = 5.");

    first.assert_async().await;
    followup.assert_async().await;
}

#[tokio::test]
async fn plain_text_is_returned_without_dispatch() {
    let mut fixture = MockServerFixture::new().await;
    let first = fixture
        .mock_chat("auto", json!({"role": "assistant", "content": "Hello there!"}))
        .await;
    let followup = fixture
        .mock_chat_times("none", json!({"content": "unused"}), 0)
        .await;

    let provider = Arc::new(FakeProvider::standard());
    let mut agent = agent_with(&fixture, provider.clone()).await;

    assert_eq!(agent.process_query("hi").await.unwrap(), "Hello there!");
    assert!(provider.calls().is_empty());
    assert_eq!(agent.conversation().len(), 2);

    first.assert_async().await;
    followup.assert_async().await;
}

#[tokio::test]
async fn empty_answer_uses_fallback_text() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_chat("auto", json!({"role": "assistant", "content": ""}))
        .await;

    let mut agent = agent_with(&fixture, Arc::new(FakeProvider::standard())).await;
    assert_eq!(agent.process_query("anything").await.unwrap(), NO_TOOL_FALLBACK);
    assert_eq!(agent.conversation().messages()[1].content_str(), "");
}

#[tokio::test]
async fn backend_failure_keeps_user_message_only() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_error_response(CHAT_PATH, 500, r#"{"error":"overloaded"}"#)
        .await;

    let mut agent = agent_with(&fixture, Arc::new(FakeProvider::standard())).await;
    let err = agent.process_query("add 2 and 3").await.unwrap_err();

    assert_eq!(err.backend_status(), Some(500));
    match err {
        Error::Backend { body, .. } => assert!(body.contains("overloaded")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(agent.conversation().len(), 1);
    assert_eq!(agent.conversation().messages()[0].role, MessageRole::User);
    assert_eq!(agent.state(), TurnState::AwaitingUser);
}

#[tokio::test]
async fn unknown_resource_is_reported_to_the_model() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_chat(
            "auto",
            json!({
                "role": "assistant",
                "content": null,
                "function_call": {"name": "get_resource_beta", "arguments": "{}"}
            }),
        )
        .await;
    fixture
        .mock_chat("none", json!({"content": "There is no such resource."}))
        .await;

    let provider = Arc::new(FakeProvider::standard());
    let mut agent = agent_with(&fixture, provider.clone()).await;

    let answer = agent.process_query("read beta").await.unwrap();
    assert_eq!(answer, "There is no such resource.");
    assert!(provider.calls().is_empty());
    assert_eq!(
        agent.conversation().messages()[2].content_str(),
        "Resource 'beta' not found."
    );
}

#[tokio::test]
async fn provider_failure_aborts_the_turn() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_chat(
            "auto",
            json!({"content": "{\"function_call\":{\"name\":\"explode\"}}"}),
        )
        .await;
    let followup = fixture
        .mock_chat_times("none", json!({"content": "unused"}), 0)
        .await;

    let mut agent = agent_with(&fixture, Arc::new(FakeProvider::standard())).await;
    let err = agent.process_query("blow up").await.unwrap_err();

    assert!(matches!(err, Error::Provider(_)));
    // user message and the assistant call stay; no function result was added
    assert_eq!(agent.conversation().len(), 2);
    followup.assert_async().await;
}

#[tokio::test]
async fn conversation_persists_across_turns() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_chat_times("auto", json!({"content": "Noted."}), 2)
        .await;

    let mut agent = agent_with(&fixture, Arc::new(FakeProvider::standard())).await;
    agent.process_query("first").await.unwrap();
    agent.process_query("second").await.unwrap();

    let contents: Vec<&str> = agent
        .conversation()
        .messages()
        .iter()
        .map(|m| m.content_str())
        .collect();
    assert_eq!(contents, ["first", "Noted.", "second", "Noted."]);
}

#[tokio::test]
async fn registry_without_capabilities_sends_no_functions() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_chat_without_functions(json!({"content": "Just chatting."}))
        .await;

    let mut agent = agent_with(&fixture, Arc::new(FakeProvider::default())).await;
    assert!(agent.functions().is_empty());
    assert_eq!(agent.process_query("hi").await.unwrap(), "Just chatting.");
    mock.assert_async().await;
}

#[tokio::test]
async fn prompt_endpoint_runs_the_same_turn() {
    let mut fixture = MockServerFixture::new().await;
    let first = fixture
        .mock_prompt(
            "system: Rules:",
            "Let me fetch that prompt.\n{\"function_call\": {\"name\": \"use_prompt_greeting\", \"arguments\": {}}}",
        )
        .await;
    let followup = fixture
        .mock_prompt("function: Please greet", "Hello, friend!")
        .await;

    let provider = Arc::new(FakeProvider::standard());
    let mut agent = McpAgent::connect(provider.clone(), fixture.prompt_endpoint_client()).await;

    let answer = agent.process_query("greet me").await.unwrap();
    assert_eq!(answer, "Hello, friend!");
    assert_eq!(
        provider.calls(),
        vec![RecordedCall::GetPrompt("greeting".into(), args(json!({})))]
    );

    first.assert_async().await;
    followup.assert_async().await;
}
