//! Conversion between the normalized transcript and `OpenAI` wire format

use roam_config::ProviderKind;

use super::{decode, model_output, parse_arguments};
use crate::catalog::ModelConfig;
use crate::error::LlmError;
use crate::protocol::openai::{
    OpenAiFunctionCall, OpenAiMessage, OpenAiMessageSlot, OpenAiRequest, OpenAiResponse, OpenAiToolCall,
};
use crate::types::{DispatchRequest, DispatchResult, Part, Role, ToolInvocation, Turn};

// -- Outbound --

/// Build a chat completions request
///
/// `provider` selects which raw turns may be replayed: an `OpenAI` payload is
/// not replayed to the Hugging Face router and vice versa.
pub fn build_request<'a>(
    provider: ProviderKind,
    model: &ModelConfig,
    request: &DispatchRequest<'a>,
) -> OpenAiRequest<'a> {
    let transcript: &'a [Turn] = request.transcript;
    let mut messages = Vec::with_capacity(transcript.len() + 1);

    if let Some(system) = request.system_prompt {
        messages.push(OpenAiMessageSlot::Built(OpenAiMessage {
            role: "system".to_owned(),
            content: Some(system.to_owned()),
            ..OpenAiMessage::default()
        }));
    }

    for turn in transcript {
        if let Some(raw) = turn.raw_for(provider) {
            messages.push(OpenAiMessageSlot::Raw(raw));
            continue;
        }
        messages.extend(turn_to_messages(turn).into_iter().map(OpenAiMessageSlot::Built));
    }

    OpenAiRequest {
        model: model.model_name.clone(),
        messages,
        temperature: request.options.temperature_for(model),
        top_p: request.options.top_p,
        max_tokens: request.options.max_tokens_for(model),
        tools: request.tools.iter().map(Into::into).collect(),
    }
}

/// One normalized turn may expand to several messages (one per tool result)
fn turn_to_messages(turn: &Turn) -> Vec<OpenAiMessage> {
    match turn.role {
        Role::User => vec![OpenAiMessage {
            role: "user".to_owned(),
            content: Some(turn.text()),
            ..OpenAiMessage::default()
        }],
        Role::Model => {
            let text = turn.text();
            vec![OpenAiMessage {
                role: "assistant".to_owned(),
                content: Some(text).filter(|t| !t.is_empty()),
                tool_calls: turn.invocations().map(to_tool_call).collect(),
                tool_call_id: None,
            }]
        }
        Role::ToolResult => turn
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionResponse(result) => Some(OpenAiMessage {
                    role: "tool".to_owned(),
                    content: Some(result.result.to_string()),
                    tool_calls: Vec::new(),
                    tool_call_id: Some(result.call_id.clone()),
                }),
                Part::Text(_) | Part::FunctionCall(_) => None,
            })
            .collect(),
    }
}

fn to_tool_call(invocation: &ToolInvocation) -> OpenAiToolCall {
    OpenAiToolCall {
        id: invocation.id.clone(),
        call_type: "function".to_owned(),
        function: OpenAiFunctionCall {
            name: invocation.name.clone(),
            arguments: super::arguments_value(invocation).to_string(),
        },
    }
}

// -- Inbound --

/// Normalize a chat completions response body
pub fn parse_response(provider: ProviderKind, body: &str) -> Result<DispatchResult, LlmError> {
    let response: OpenAiResponse = decode(provider, body)?;

    let Some(choice) = response.choices.into_iter().next() else {
        return Err(LlmError::Permanent(format!("{provider} returned no choices")));
    };

    let message: OpenAiMessage = decode(provider, choice.message.get())?;

    let invocations = message
        .tool_calls
        .into_iter()
        .map(|call| ToolInvocation::with_id(call.id, call.function.name, parse_arguments(&call.function.arguments)))
        .collect();

    Ok(model_output(
        provider,
        choice.message,
        message.content.unwrap_or_default(),
        invocations,
    ))
}
