//! `OpenAI` chat completions wire format types
//!
//! Also spoken by the Hugging Face router.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::FunctionTool;

/// `POST /chat/completions` request body
#[derive(Debug, Serialize)]
pub struct OpenAiRequest<'a> {
    pub model: String,
    pub messages: Vec<OpenAiMessageSlot<'a>>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionTool>,
}

/// Entry of `messages`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OpenAiMessageSlot<'a> {
    /// Assistant message replayed exactly as received
    Raw(&'a RawValue),
    Built(OpenAiMessage),
}

/// Chat message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<OpenAiToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Tool call emitted by the assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: OpenAiFunctionCall,
}

/// Function name and JSON-encoded arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiFunctionCall {
    pub name: String,
    /// Arguments as a JSON string
    pub arguments: String,
}

/// `POST /chat/completions` response body
#[derive(Debug, Deserialize)]
pub struct OpenAiResponse {
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAiChoice {
    /// Assistant message, kept unparsed for verbatim replay
    pub message: Box<RawValue>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}
