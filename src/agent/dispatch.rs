//! Routing of call intents to the capability provider.
//!
//! The function name alone decides the category (see [`CallTarget`]). An
//! unknown resource is a recoverable outcome reported back to the model;
//! provider failures are propagated to whoever runs the turn.

use tracing::{info, warn};

use crate::mcp::{CallTarget, CapabilityProvider};
use crate::registry::CapabilityRegistry;
use crate::types::tool::{CallIntent, CapabilityCategory, DispatchResult};
use crate::Result;

pub struct Dispatcher<'a> {
    registry: &'a CapabilityRegistry,
    provider: &'a dyn CapabilityProvider,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a CapabilityRegistry, provider: &'a dyn CapabilityProvider) -> Self {
        Self { registry, provider }
    }

    pub async fn dispatch(&self, intent: &CallIntent) -> Result<DispatchResult> {
        let target = CallTarget::from_function_name(&intent.name);
        info!(
            function = %intent.name,
            category = %target.category(),
            arguments = %intent.arguments_json(),
            "dispatching call"
        );

        let result = match target {
            CallTarget::Resource(name) => self.read_resource(name).await?,
            CallTarget::Prompt(name) => {
                let prompt = self.provider.get_prompt(name, &intent.arguments).await?;
                DispatchResult::ok(CapabilityCategory::Prompt, prompt.render())
            }
            CallTarget::Tool(name) => {
                let outcome = self.provider.call_tool(name, &intent.arguments).await?;
                let text = outcome.render();
                if outcome.is_error {
                    warn!(tool = name, %text, "tool reported an error");
                    DispatchResult::failed(CapabilityCategory::Tool, text)
                } else {
                    DispatchResult::ok(CapabilityCategory::Tool, text)
                }
            }
        };
        Ok(result)
    }

    async fn read_resource(&self, name: &str) -> Result<DispatchResult> {
        let Some(resource) = self.registry.find_resource(name) else {
            warn!(resource = name, "call names an unknown resource");
            return Ok(DispatchResult::failed(
                CapabilityCategory::Resource,
                format!("Resource '{name}' not found."),
            ));
        };

        let read = self.provider.read_resource(&resource.uri).await?;
        let text = match read.contents.first() {
            None => format!("Resource '{name}' has no content."),
            Some(item) => match &item.text {
                Some(text) => text.clone(),
                None => serde_json::to_string(item)?,
            },
        };
        Ok(DispatchResult::ok(CapabilityCategory::Resource, text))
    }
}
