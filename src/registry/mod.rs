//! 能力注册表：会话开始时一次性获取的工具、资源与提示模板
//!
//! Capability registry. Holds the descriptors fetched from the provider once
//! at session start, in projection order (tools, then resources, then
//! prompts). Immutable for the rest of the session.

use tracing::{info, warn};

use crate::mcp::{
    bridge, CapabilityDescriptor, CapabilityProvider, McpPrompt, McpResource, McpTool,
    ProviderError,
};
use crate::types::tool::{CapabilityCategory, FunctionDefinition};

#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    descriptors: Vec<CapabilityDescriptor>,
}

impl CapabilityRegistry {
    /// List all three categories. Never fails: a listing error leaves that
    /// category empty and the session proceeds.
    pub async fn fetch(provider: &dyn CapabilityProvider) -> Self {
        let tools = degrade(CapabilityCategory::Tool, provider.list_tools().await);
        let resources = degrade(CapabilityCategory::Resource, provider.list_resources().await);
        let prompts = degrade(CapabilityCategory::Prompt, provider.list_prompts().await);

        info!(
            tools = tools.len(),
            resources = resources.len(),
            prompts = prompts.len(),
            "capability registry loaded"
        );
        Self::from_parts(tools, resources, prompts)
    }

    pub fn from_parts(
        tools: Vec<McpTool>,
        resources: Vec<McpResource>,
        prompts: Vec<McpPrompt>,
    ) -> Self {
        let descriptors = tools
            .into_iter()
            .map(CapabilityDescriptor::Tool)
            .chain(resources.into_iter().map(CapabilityDescriptor::Resource))
            .chain(prompts.into_iter().map(CapabilityDescriptor::Prompt))
            .collect();
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[CapabilityDescriptor] {
        &self.descriptors
    }

    pub fn tools(&self) -> impl Iterator<Item = &McpTool> {
        self.descriptors.iter().filter_map(|d| match d {
            CapabilityDescriptor::Tool(t) => Some(t),
            _ => None,
        })
    }

    pub fn resources(&self) -> impl Iterator<Item = &McpResource> {
        self.descriptors.iter().filter_map(|d| match d {
            CapabilityDescriptor::Resource(r) => Some(r),
            _ => None,
        })
    }

    pub fn prompts(&self) -> impl Iterator<Item = &McpPrompt> {
        self.descriptors.iter().filter_map(|d| match d {
            CapabilityDescriptor::Prompt(p) => Some(p),
            _ => None,
        })
    }

    /// First resource whose name matches exactly.
    pub fn find_resource(&self, name: &str) -> Option<&McpResource> {
        self.resources().find(|r| r.name == name)
    }

    /// Function schemas in registry order.
    pub fn function_schemas(&self) -> Vec<FunctionDefinition> {
        bridge::project_descriptors(&self.descriptors)
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }
}

fn degrade<T>(category: CapabilityCategory, listed: Result<Vec<T>, ProviderError>) -> Vec<T> {
    match listed {
        Ok(items) => items,
        Err(ProviderError::Unsupported(_)) => {
            info!(%category, "provider does not offer this category");
            Vec::new()
        }
        Err(e) => {
            warn!(%category, error = %e, "listing failed, continuing without it");
            Vec::new()
        }
    }
}
