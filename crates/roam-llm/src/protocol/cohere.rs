//! Cohere v2 chat wire format types

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::FunctionTool;

/// `POST /v2/chat` request body
#[derive(Debug, Serialize)]
pub struct CohereRequest<'a> {
    pub model: String,
    pub messages: Vec<CohereMessageSlot<'a>>,
    pub temperature: f64,
    /// Nucleus sampling, Cohere's name for `top_p`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionTool>,
}

/// Entry of `messages`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CohereMessageSlot<'a> {
    /// Assistant message replayed exactly as received
    Raw(&'a RawValue),
    Built(CohereMessage),
}

/// Outbound chat message
#[derive(Debug, Clone, Default, Serialize)]
pub struct CohereMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<CohereToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Tool call, shaped like `OpenAI`'s
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohereToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: CohereFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohereFunctionCall {
    pub name: String,
    /// Arguments as a JSON string
    pub arguments: String,
}

/// `POST /v2/chat` response body
#[derive(Debug, Deserialize)]
pub struct CohereResponse {
    /// Assistant message, kept unparsed for verbatim replay
    pub message: Box<RawValue>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Parsed view of the response message
#[derive(Debug, Default, Deserialize)]
pub struct CohereResponseMessage {
    #[serde(default)]
    pub content: Vec<CohereContentItem>,
    #[serde(default)]
    pub tool_calls: Vec<CohereToolCall>,
    #[serde(default)]
    pub tool_plan: Option<String>,
}

/// Content item in a response message
#[derive(Debug, Deserialize)]
pub struct CohereContentItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub text: Option<String>,
}
