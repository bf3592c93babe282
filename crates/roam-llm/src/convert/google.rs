//! Conversion between the normalized transcript and Google wire format

use roam_config::ProviderKind;
use serde_json::Value;

use super::{arguments_value, decode, model_output};
use crate::catalog::ModelConfig;
use crate::error::LlmError;
use crate::protocol::google::{
    GoogleContent, GoogleFunctionCall, GoogleFunctionDeclaration, GoogleFunctionResponse, GoogleGenerationConfig,
    GooglePart, GoogleRequest, GoogleResponse, GoogleTool, GoogleTurn,
};
use crate::types::{DispatchRequest, DispatchResult, Part, Role, ToolInvocation, Turn};

/// Nucleus sampling applied when the caller does not choose one
pub const DEFAULT_TOP_P: f64 = 0.9;

// -- Outbound: dispatch request -> Google wire request --

/// Build a `generateContent` request
pub fn build_request<'a>(model: &ModelConfig, request: &DispatchRequest<'a>) -> GoogleRequest<'a> {
    let transcript: &'a [Turn] = request.transcript;
    let contents = transcript
        .iter()
        .map(|turn| match turn.raw_for(ProviderKind::Google) {
            Some(raw) => GoogleTurn::Raw(raw),
            None => GoogleTurn::Built(turn_to_content(turn)),
        })
        .collect();

    let system_instruction = request.system_prompt.map(|prompt| GoogleContent {
        role: None,
        parts: vec![text_part(prompt)],
    });

    let tools = if request.tools.is_empty() {
        Vec::new()
    } else {
        vec![GoogleTool {
            function_declarations: request
                .tools
                .iter()
                .map(|tool| GoogleFunctionDeclaration {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                })
                .collect(),
        }]
    };

    GoogleRequest {
        contents,
        system_instruction,
        generation_config: GoogleGenerationConfig {
            temperature: request.options.temperature_for(model),
            top_p: request.options.top_p.unwrap_or(DEFAULT_TOP_P),
            max_output_tokens: request.options.max_tokens_for(model),
        },
        tools,
    }
}

fn turn_to_content(turn: &Turn) -> GoogleContent {
    let role = match turn.role {
        Role::Model => "model",
        // Function responses travel in a user-role content
        Role::User | Role::ToolResult => "user",
    };

    let parts = turn
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => text_part(text),
            Part::FunctionCall(invocation) => GooglePart {
                function_call: Some(GoogleFunctionCall {
                    name: invocation.name.clone(),
                    args: arguments_value(invocation),
                }),
                ..GooglePart::default()
            },
            Part::FunctionResponse(result) => GooglePart {
                function_response: Some(GoogleFunctionResponse {
                    name: result.tool_name.clone(),
                    response: result.as_object(),
                }),
                ..GooglePart::default()
            },
        })
        .collect();

    GoogleContent {
        role: Some(role.to_owned()),
        parts,
    }
}

fn text_part(text: &str) -> GooglePart {
    GooglePart {
        text: Some(text.to_owned()),
        ..GooglePart::default()
    }
}

// -- Inbound: Google wire response -> dispatch result --

/// Normalize a `generateContent` response body
pub fn parse_response(body: &str) -> Result<DispatchResult, LlmError> {
    let response: GoogleResponse = decode(ProviderKind::Google, body)?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates".to_owned());
        return Err(LlmError::Permanent(format!("google returned no answer: {reason}")));
    };

    let Some(raw) = candidate.content else {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_owned());
        return Err(LlmError::Permanent(format!(
            "google returned an empty candidate (finish reason: {reason})"
        )));
    };

    let content: GoogleContent = decode(ProviderKind::Google, raw.get())?;

    let mut text = String::new();
    let mut invocations = Vec::new();
    for part in content.parts {
        if part.thought == Some(true) {
            continue;
        }
        if let Some(fragment) = part.text {
            text.push_str(&fragment);
        }
        if let Some(call) = part.function_call {
            let args = if call.args.is_null() { Value::Object(serde_json::Map::new()) } else { call.args };
            invocations.push(ToolInvocation::new(call.name, args));
        }
    }

    Ok(model_output(ProviderKind::Google, raw, text, invocations))
}
