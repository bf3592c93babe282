//! Ollama `/api/chat` wire format types

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::FunctionTool;

/// `POST /api/chat` request body
#[derive(Debug, Serialize)]
pub struct OllamaRequest<'a> {
    pub model: String,
    pub messages: Vec<OllamaMessageSlot<'a>>,
    /// Always `false`; responses are read whole
    pub stream: bool,
    pub options: OllamaOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionTool>,
}

/// Entry of `messages`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OllamaMessageSlot<'a> {
    Raw(&'a RawValue),
    Built(OllamaMessage),
}

/// Chat message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<OllamaToolCall>,
}

/// Tool call; Ollama assigns no ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaToolCall {
    pub function: OllamaFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaFunctionCall {
    pub name: String,
    /// Arguments as a JSON object
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Sampling options
#[derive(Debug, Clone, Serialize)]
pub struct OllamaOptions {
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Output token cap
    pub num_predict: u32,
}

/// `POST /api/chat` response body
#[derive(Debug, Deserialize)]
pub struct OllamaResponse {
    /// Assistant message, kept unparsed for verbatim replay
    pub message: Box<RawValue>,
    #[serde(default)]
    pub done: bool,
}
