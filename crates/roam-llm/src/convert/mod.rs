//! Conversion between the normalized transcript and provider wire formats
//!
//! Outbound, each module builds a provider request from a
//! [`DispatchRequest`](crate::types::DispatchRequest). Inbound, it maps the
//! provider response to [`DispatchResult::Text`] or
//! [`DispatchResult::ToolCall`].

pub mod anthropic;
pub mod cohere;
pub mod google;
pub mod ollama;
pub mod openai;

use roam_config::ProviderKind;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::value::RawValue;

use crate::error::LlmError;
use crate::protocol::{FunctionSpec, FunctionTool};
use crate::types::{DispatchResult, Part, RawTurn, Role, ToolCallResult, ToolDeclaration, ToolInvocation, Turn};

impl From<&ToolDeclaration> for FunctionTool {
    fn from(tool: &ToolDeclaration) -> Self {
        Self {
            tool_type: "function".to_owned(),
            function: FunctionSpec {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.parameters.clone()),
            },
        }
    }
}

/// Decode a provider payload, treating malformed bodies as permanent
pub(crate) fn decode<T: DeserializeOwned>(provider: ProviderKind, body: &str) -> Result<T, LlmError> {
    serde_json::from_str(body).map_err(|e| LlmError::Permanent(format!("failed to parse {provider} response: {e}")))
}

/// Parse JSON-encoded tool arguments, keeping unparseable text as a string
pub(crate) fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Arguments of an invocation as a JSON object value
pub(crate) fn arguments_value(invocation: &ToolInvocation) -> Value {
    Value::Object(invocation.arguments.clone())
}

/// Normalize one model turn into a dispatch result
///
/// Without invocations the turn is a plain answer. Otherwise the raw
/// payload is attached to the model turn so it can be replayed unchanged.
pub(crate) fn model_output(
    provider: ProviderKind,
    raw: Box<RawValue>,
    text: String,
    invocations: Vec<ToolInvocation>,
) -> DispatchResult {
    if invocations.is_empty() {
        return DispatchResult::Text(text);
    }

    let mut parts = Vec::with_capacity(invocations.len() + 1);
    if !text.is_empty() {
        parts.push(Part::Text(text.clone()));
    }
    parts.extend(invocations.iter().cloned().map(Part::FunctionCall));

    DispatchResult::ToolCall(ToolCallResult {
        invocations,
        raw_model_turn: Turn {
            role: Role::Model,
            parts,
            raw: Some(RawTurn { provider, content: raw }),
        },
        partial_text: Some(text).filter(|t| !t.is_empty()),
    })
}
