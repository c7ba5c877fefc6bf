//! Dispatcher routing per capability category

use mcp_chat_client::agent::Dispatcher;
use mcp_chat_client::{CallIntent, CapabilityCategory, CapabilityRegistry, Error};
use serde_json::json;

use crate::fake_provider::{args, FakeProvider, RecordedCall};

async fn registry(provider: &FakeProvider) -> CapabilityRegistry {
    CapabilityRegistry::fetch(provider).await
}

#[tokio::test]
async fn resource_returns_first_content_text() {
    let provider = FakeProvider::standard();
    let registry = registry(&provider).await;

    let result = Dispatcher::new(&registry, &provider)
        .dispatch(&CallIntent::new("get_resource_alpha", Default::default()))
        .await
        .unwrap();

    assert_eq!(result.category, CapabilityCategory::Resource);
    assert_eq!(result.text, "alpha body");
    assert!(!result.is_error);
    assert_eq!(
        provider.calls(),
        vec![RecordedCall::ReadResource("file:///alpha.txt".into())]
    );
}

#[tokio::test]
async fn empty_resource_says_so() {
    let provider = FakeProvider::standard();
    let registry = registry(&provider).await;

    let result = Dispatcher::new(&registry, &provider)
        .dispatch(&CallIntent::new("get_resource_empty", Default::default()))
        .await
        .unwrap();
    assert_eq!(result.text, "Resource 'empty' has no content.");
}

#[tokio::test]
async fn missing_resource_never_reaches_the_provider() {
    let provider = FakeProvider::standard();
    let registry = registry(&provider).await;

    let result = Dispatcher::new(&registry, &provider)
        .dispatch(&CallIntent::new("get_resource_alphabet", Default::default()))
        .await
        .unwrap();

    assert!(result.is_error);
    assert_eq!(result.text, "Resource 'alphabet' not found.");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn prompt_is_fetched_by_stripped_name() {
    let provider = FakeProvider::standard();
    let registry = registry(&provider).await;

    let result = Dispatcher::new(&registry, &provider)
        .dispatch(&CallIntent::new("use_prompt_greeting", args(json!({"tone": "warm"}))))
        .await
        .unwrap();

    assert_eq!(result.category, CapabilityCategory::Prompt);
    assert_eq!(result.text, "Please greet the user warmly (greeting).");
    assert_eq!(
        provider.calls(),
        vec![RecordedCall::GetPrompt("greeting".into(), args(json!({"tone": "warm"})))]
    );
}

#[tokio::test]
async fn unprefixed_names_are_tool_calls() {
    let provider = FakeProvider::standard();
    let registry = registry(&provider).await;
    let dispatcher = Dispatcher::new(&registry, &provider);

    let sum = dispatcher
        .dispatch(&CallIntent::new("add", args(json!({"a": 1.5, "b": 2}))))
        .await
        .unwrap();
    assert_eq!(sum.category, CapabilityCategory::Tool);
    assert_eq!(sum.text, "3.5");

    let grumpy = dispatcher
        .dispatch(&CallIntent::new("grumpy", Default::default()))
        .await
        .unwrap();
    assert!(grumpy.is_error);
    assert_eq!(grumpy.text, "not today");

    // tools the registry does not list are still forwarded
    let unknown = dispatcher
        .dispatch(&CallIntent::new("mystery", Default::default()))
        .await
        .unwrap();
    assert_eq!(unknown.text, "");
}

#[tokio::test]
async fn provider_errors_propagate() {
    let provider = FakeProvider::standard();
    let registry = registry(&provider).await;

    let err = Dispatcher::new(&registry, &provider)
        .dispatch(&CallIntent::new("explode", Default::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
}

#[tokio::test]
async fn unsupported_prompts_leave_tools_and_resources() {
    let provider = FakeProvider::standard().without_prompts();
    let registry = registry(&provider).await;

    assert_eq!(registry.prompts().count(), 0);
    assert_eq!(registry.tools().count(), 3);
    let names: Vec<String> = registry
        .function_schemas()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(
        names,
        ["add", "explode", "grumpy", "get_resource_alpha", "get_resource_empty"]
    );
}
