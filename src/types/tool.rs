//! Function calling types shared by the projector, parser and dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Callable-function schema handed to the model.
///
/// Names are unique across the projected set as long as the underlying
/// capability names obey the prefixing convention of [`crate::mcp::bridge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value, // JSON Schema
}

impl FunctionDefinition {
    /// Schema of a function that takes no arguments.
    pub fn empty_parameters() -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }
}

/// A structured invocation recovered from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallIntent {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl CallIntent {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Build a call intent from the value found under a `function_call` key.
    ///
    /// Returns `None` unless the value is an object with a non-empty string
    /// `name`. Arguments are normalized with [`normalize_arguments`].
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let name = obj.get("name")?.as_str()?.trim();
        if name.is_empty() {
            return None;
        }
        let arguments = normalize_arguments(obj.get("arguments"));
        Some(Self::new(name, arguments))
    }

    /// Arguments encoded as a JSON string, the way OpenAI-style backends expect them.
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

/// Normalize a raw `arguments` value into a mapping.
///
/// A JSON-encoded string is decoded once more. Anything that does not end up
/// as an object (absent, null, malformed string, array, scalar) becomes an
/// empty mapping; this never fails.
pub fn normalize_arguments(raw: Option<&Value>) -> Map<String, Value> {
    match raw {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Map::new();
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    tracing::debug!(value = %other, "call arguments decoded to a non-object, using empty arguments");
                    Map::new()
                }
                Err(e) => {
                    tracing::debug!(error = %e, "call arguments are not valid JSON, using empty arguments");
                    Map::new()
                }
            }
        }
        _ => Map::new(),
    }
}

/// Which capability family a projected function belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityCategory {
    Tool,
    Resource,
    Prompt,
}

impl CapabilityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityCategory::Tool => "tools",
            CapabilityCategory::Resource => "resources",
            CapabilityCategory::Prompt => "prompts",
        }
    }
}

impl std::fmt::Display for CapabilityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized outcome of executing a call intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub category: CapabilityCategory,
    pub text: String,
    /// Set for recoverable failures (unknown resource, tool reporting an error).
    #[serde(default)]
    pub is_error: bool,
}

impl DispatchResult {
    pub fn ok(category: CapabilityCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
            is_error: false,
        }
    }

    pub fn failed(category: CapabilityCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
            is_error: true,
        }
    }
}
