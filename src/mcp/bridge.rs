//! Projection of capabilities into one flat function namespace.
//!
//! Tools keep their own name. Resources and prompts are prefixed with
//! [`RESOURCE_PREFIX`] and [`PROMPT_PREFIX`] so the dispatcher can route a call
//! back to its category by name alone. The prefixes are the only uniqueness
//! mechanism: a tool literally named `get_resource_x` shadows a resource `x`.
//! Such collisions are logged but not resolved.

use std::collections::HashSet;

use super::{CapabilityDescriptor, McpPrompt, McpResource, McpTool};
use crate::types::tool::{CapabilityCategory, FunctionDefinition};

pub const RESOURCE_PREFIX: &str = "get_resource_";
pub const PROMPT_PREFIX: &str = "use_prompt_";

const NO_DESCRIPTION: &str = "No description provided.";

/// Project the three capability lists, in that order, into function schemas.
pub fn project(
    tools: &[McpTool],
    resources: &[McpResource],
    prompts: &[McpPrompt],
) -> Vec<FunctionDefinition> {
    let descriptors: Vec<CapabilityDescriptor> = tools
        .iter()
        .cloned()
        .map(CapabilityDescriptor::Tool)
        .chain(resources.iter().cloned().map(CapabilityDescriptor::Resource))
        .chain(prompts.iter().cloned().map(CapabilityDescriptor::Prompt))
        .collect();
    project_descriptors(&descriptors)
}

/// Project descriptors in the order given.
pub fn project_descriptors(descriptors: &[CapabilityDescriptor]) -> Vec<FunctionDefinition> {
    let mut seen = HashSet::new();
    descriptors
        .iter()
        .map(|d| {
            let schema = project_descriptor(d);
            if !seen.insert(schema.name.clone()) {
                tracing::warn!(
                    function = %schema.name,
                    category = %d.category(),
                    "projected function name collides with an earlier capability"
                );
            }
            schema
        })
        .collect()
}

/// The single place that knows the per-category projection rule.
pub fn project_descriptor(descriptor: &CapabilityDescriptor) -> FunctionDefinition {
    match descriptor {
        CapabilityDescriptor::Tool(tool) => FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool
                .input_schema
                .clone()
                .unwrap_or_else(FunctionDefinition::empty_parameters),
        },
        CapabilityDescriptor::Resource(resource) => FunctionDefinition {
            name: format!("{}{}", RESOURCE_PREFIX, resource.name),
            description: Some(format!(
                "Read the resource '{}'. {}",
                resource.name,
                resource.description.as_deref().unwrap_or(NO_DESCRIPTION)
            )),
            parameters: FunctionDefinition::empty_parameters(),
        },
        CapabilityDescriptor::Prompt(prompt) => FunctionDefinition {
            name: format!("{}{}", PROMPT_PREFIX, prompt.name),
            description: Some(format!(
                "Use the prompt template '{}'. {}",
                prompt.name,
                prompt.description.as_deref().unwrap_or(NO_DESCRIPTION)
            )),
            parameters: FunctionDefinition::empty_parameters(),
        },
    }
}

/// Where a projected function name routes back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget<'a> {
    Tool(&'a str),
    Resource(&'a str),
    Prompt(&'a str),
}

impl<'a> CallTarget<'a> {
    /// Route by prefix. Names with neither prefix are tool calls.
    pub fn from_function_name(name: &'a str) -> Self {
        if let Some(resource) = name.strip_prefix(RESOURCE_PREFIX) {
            CallTarget::Resource(resource)
        } else if let Some(prompt) = name.strip_prefix(PROMPT_PREFIX) {
            CallTarget::Prompt(prompt)
        } else {
            CallTarget::Tool(name)
        }
    }

    pub fn category(&self) -> CapabilityCategory {
        match self {
            CallTarget::Tool(_) => CapabilityCategory::Tool,
            CallTarget::Resource(_) => CapabilityCategory::Resource,
            CallTarget::Prompt(_) => CapabilityCategory::Prompt,
        }
    }
}
