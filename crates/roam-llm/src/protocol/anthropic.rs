//! Anthropic Messages API wire format types

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Value sent in the `anthropic-version` header
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// `POST /v1/messages` request body
#[derive(Debug, Serialize)]
pub struct AnthropicRequest<'a> {
    pub model: String,
    /// Required by the API
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessageSlot<'a>>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<AnthropicTool>,
}

/// Entry of `messages`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnthropicMessageSlot<'a> {
    /// Assistant turn whose `content` array is replayed verbatim
    Raw {
        role: &'static str,
        content: &'a RawValue,
    },
    Built(AnthropicMessage),
}

/// Conversation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: Vec<AnthropicBlock>,
}

/// Content block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Block kinds this gateway does not interpret (thinking and the like)
    #[serde(other)]
    Other,
}

/// Tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicTool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// `POST /v1/messages` response body
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// Content blocks, kept unparsed for verbatim replay
    pub content: Box<RawValue>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}
