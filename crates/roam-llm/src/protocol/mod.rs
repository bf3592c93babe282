//! Wire formats of the upstream provider APIs

pub mod anthropic;
pub mod cohere;
pub mod google;
pub mod ollama;
pub mod openai;

use serde::{Deserialize, Serialize};

/// `{"type": "function", "function": {...}}` tool shape shared by the
/// OpenAI-style APIs (`OpenAI`, Hugging Face, Cohere v2, Ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionSpec,
}

/// Function signature inside a [`FunctionTool`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}
