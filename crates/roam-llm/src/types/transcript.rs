use roam_config::ProviderKind;
use serde_json::value::RawValue;

use super::tool::{ToolInvocation, ToolResult};

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// End user
    User,
    /// Model output, including tool-call requests
    Model,
    /// Results of executed tools, fed back to the model
    ToolResult,
}

/// Piece of a turn
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Model asked for a tool to run
    FunctionCall(ToolInvocation),
    /// Outcome of running a tool
    FunctionResponse(ToolResult),
}

/// Provider response turn kept byte-for-byte as it arrived
///
/// Replayed unchanged when the next call goes to the same provider, so
/// provider-internal metadata (thought signatures, call ids) survives.
#[derive(Debug, Clone)]
pub struct RawTurn {
    /// Provider that produced the turn
    pub provider: ProviderKind,
    /// Exact JSON of the turn
    pub content: Box<RawValue>,
}

/// One entry of a conversation transcript
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
    /// Original provider payload for model turns that carried tool calls
    pub raw: Option<RawTurn>,
}

impl Turn {
    /// Plain user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
            raw: None,
        }
    }

    /// Plain model message
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text(text.into())],
            raw: None,
        }
    }

    /// Synthetic turn carrying every result of one tool round
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::ToolResult,
            parts: results.into_iter().map(Part::FunctionResponse).collect(),
            raw: None,
        }
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::FunctionCall(_) | Part::FunctionResponse(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool invocations requested in this turn
    pub fn invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts.iter().filter_map(|part| match part {
            Part::FunctionCall(invocation) => Some(invocation),
            Part::Text(_) | Part::FunctionResponse(_) => None,
        })
    }

    /// Raw payload, if it was produced by `provider`
    pub fn raw_for(&self, provider: ProviderKind) -> Option<&RawValue> {
        self.raw
            .as_ref()
            .filter(|raw| raw.provider == provider)
            .map(|raw| raw.content.as_ref())
    }
}
