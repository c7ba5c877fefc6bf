use serde_json::Value;

use crate::types::message::AssistantTurn;
use crate::types::tool::CallIntent;

/// Literal that opens an embedded call object in model output.
///
/// This is a plain substring search: text that merely quotes the marker (a
/// tool description echoed back, for example) will be taken for a call attempt.
/// If the JSON after it does not parse, the parser falls through to the other
/// strategies, so the worst case is a missed call, never an error.
pub const FUNCTION_CALL_MARKER: &str = r#"{"function_call":"#;

/// Recover a call intent from raw backend text.
///
/// Strategies, in order:
/// 1. Find the first [`FUNCTION_CALL_MARKER`] and parse everything from there
///    to the end as a JSON object holding a `function_call` key. Prose before
///    the marker is kept as reasoning.
/// 2. Parse the whole text as such an object.
/// 3. Otherwise the whole text is visible content.
///
/// This never fails: malformed JSON simply falls through to the next strategy.
pub fn parse_assistant_output(raw: &str) -> AssistantTurn {
    if let Some((intent, reasoning)) = scan_embedded_call(raw) {
        if let Some(reasoning) = reasoning.as_deref() {
            tracing::info!(reasoning, "model reasoning before call marker");
        }
        return AssistantTurn::call(intent, reasoning);
    }

    if let Some(intent) = whole_text_call(raw) {
        return AssistantTurn::call(intent, None);
    }

    AssistantTurn::text(raw)
}

fn scan_embedded_call(raw: &str) -> Option<(CallIntent, Option<String>)> {
    let start = raw.find(FUNCTION_CALL_MARKER)?;
    let tail = raw[start..].trim();
    let intent = match serde_json::from_str::<Value>(tail) {
        Ok(value) => function_call_of(&value)?,
        Err(e) => {
            tracing::debug!(error = %e, offset = start, "call marker found but tail is not valid JSON");
            return None;
        }
    };

    let reasoning = raw[..start].trim();
    let reasoning = (!reasoning.is_empty()).then(|| reasoning.to_string());
    Some((intent, reasoning))
}

fn whole_text_call(raw: &str) -> Option<CallIntent> {
    let value = serde_json::from_str::<Value>(raw).ok()?;
    function_call_of(&value)
}

fn function_call_of(value: &Value) -> Option<CallIntent> {
    let call = value.as_object()?.get("function_call")?;
    CallIntent::from_value(call)
}
