//! Conversion between the normalized transcript and Ollama wire format

use roam_config::ProviderKind;

use super::{arguments_value, decode, model_output};
use crate::catalog::ModelConfig;
use crate::error::LlmError;
use crate::protocol::ollama::{
    OllamaFunctionCall, OllamaMessage, OllamaMessageSlot, OllamaOptions, OllamaRequest, OllamaResponse,
    OllamaToolCall,
};
use crate::types::{DispatchRequest, DispatchResult, Part, Role, ToolInvocation, Turn};

/// Build an `/api/chat` request
pub fn build_request<'a>(model: &ModelConfig, request: &DispatchRequest<'a>) -> OllamaRequest<'a> {
    let transcript: &'a [Turn] = request.transcript;
    let mut messages = Vec::with_capacity(transcript.len() + 1);

    if let Some(system) = request.system_prompt {
        messages.push(OllamaMessageSlot::Built(message("system", system.to_owned())));
    }

    for turn in transcript {
        if let Some(raw) = turn.raw_for(ProviderKind::Ollama) {
            messages.push(OllamaMessageSlot::Raw(raw));
            continue;
        }
        match turn.role {
            Role::User => messages.push(OllamaMessageSlot::Built(message("user", turn.text()))),
            Role::Model => messages.push(OllamaMessageSlot::Built(OllamaMessage {
                role: "assistant".to_owned(),
                content: turn.text(),
                tool_calls: turn
                    .invocations()
                    .map(|invocation| OllamaToolCall {
                        function: OllamaFunctionCall {
                            name: invocation.name.clone(),
                            arguments: arguments_value(invocation),
                        },
                    })
                    .collect(),
            })),
            Role::ToolResult => messages.extend(turn.parts.iter().filter_map(|part| match part {
                Part::FunctionResponse(result) => {
                    Some(OllamaMessageSlot::Built(message("tool", result.result.to_string())))
                }
                Part::Text(_) | Part::FunctionCall(_) => None,
            })),
        }
    }

    OllamaRequest {
        model: model.model_name.clone(),
        messages,
        stream: false,
        options: OllamaOptions {
            temperature: request.options.temperature_for(model),
            top_p: request.options.top_p,
            num_predict: request.options.max_tokens_for(model),
        },
        tools: request.tools.iter().map(Into::into).collect(),
    }
}

fn message(role: &str, content: String) -> OllamaMessage {
    OllamaMessage {
        role: role.to_owned(),
        content,
        tool_calls: Vec::new(),
    }
}

/// Normalize an `/api/chat` response body
pub fn parse_response(body: &str) -> Result<DispatchResult, LlmError> {
    let response: OllamaResponse = decode(ProviderKind::Ollama, body)?;
    let parsed: OllamaMessage = decode(ProviderKind::Ollama, response.message.get())?;

    let invocations = parsed
        .tool_calls
        .into_iter()
        .map(|call| ToolInvocation::new(call.function.name, call.function.arguments))
        .collect();

    Ok(model_output(ProviderKind::Ollama, response.message, parsed.content, invocations))
}
