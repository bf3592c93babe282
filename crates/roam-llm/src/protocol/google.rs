//! Google Generative Language API wire format types

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

// -- Request types --

/// Google `generateContent` request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleRequest<'a> {
    /// Conversation contents
    pub contents: Vec<GoogleTurn<'a>>,
    /// System instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GoogleContent>,
    /// Generation configuration
    pub generation_config: GoogleGenerationConfig,
    /// Tool definitions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<GoogleTool>,
}

/// Entry of `contents`: either replayed verbatim or built from parts
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GoogleTurn<'a> {
    /// Candidate content exactly as an earlier response returned it
    Raw(&'a RawValue),
    /// Content assembled from normalized parts
    Built(GoogleContent),
}

/// Google content object containing role and parts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleContent {
    /// Role ("user" or "model")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts
    #[serde(default)]
    pub parts: Vec<GooglePart>,
}

/// Individual part within a Google content object
///
/// Modelled as a struct of optional members rather than an enum so parts
/// carrying extra keys (thought signatures and the like) still parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePart {
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Function call from the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<GoogleFunctionCall>,
    /// Function response from the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<GoogleFunctionResponse>,
    /// Set on reasoning summaries, which are not part of the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

/// Function call from the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleFunctionCall {
    /// Function name
    pub name: String,
    /// Function arguments as JSON
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Function response from the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleFunctionResponse {
    /// Function name
    pub name: String,
    /// Response content as a JSON object
    pub response: serde_json::Value,
}

/// Generation configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleGenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

/// Google tool definition wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleTool {
    /// Function declarations
    pub function_declarations: Vec<GoogleFunctionDeclaration>,
}

/// Google function declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleFunctionDeclaration {
    pub name: String,
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: serde_json::Value,
}

// -- Response types --

/// Google `generateContent` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleResponse {
    #[serde(default)]
    pub candidates: Vec<GoogleCandidate>,
    #[serde(default)]
    pub prompt_feedback: Option<GooglePromptFeedback>,
}

/// One response candidate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCandidate {
    /// Candidate content, kept unparsed so it can be replayed verbatim
    #[serde(default)]
    pub content: Option<Box<RawValue>>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Reason a prompt was refused
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}
