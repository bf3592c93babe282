//! Conversion between the normalized transcript and Cohere v2 wire format

use roam_config::ProviderKind;

use super::{arguments_value, decode, model_output, parse_arguments};
use crate::catalog::ModelConfig;
use crate::error::LlmError;
use crate::protocol::cohere::{
    CohereFunctionCall, CohereMessage, CohereMessageSlot, CohereRequest, CohereResponse, CohereResponseMessage,
    CohereToolCall,
};
use crate::types::{DispatchRequest, DispatchResult, Part, Role, ToolInvocation, Turn};

/// Build a `/v2/chat` request
pub fn build_request<'a>(model: &ModelConfig, request: &DispatchRequest<'a>) -> CohereRequest<'a> {
    let transcript: &'a [Turn] = request.transcript;
    let mut messages = Vec::with_capacity(transcript.len() + 1);

    if let Some(system) = request.system_prompt {
        messages.push(CohereMessageSlot::Built(CohereMessage {
            role: "system".to_owned(),
            content: Some(system.to_owned()),
            ..CohereMessage::default()
        }));
    }

    for turn in transcript {
        if let Some(raw) = turn.raw_for(ProviderKind::Cohere) {
            messages.push(CohereMessageSlot::Raw(raw));
            continue;
        }
        match turn.role {
            Role::User => messages.push(CohereMessageSlot::Built(CohereMessage {
                role: "user".to_owned(),
                content: Some(turn.text()),
                ..CohereMessage::default()
            })),
            Role::Model => messages.push(CohereMessageSlot::Built(CohereMessage {
                role: "assistant".to_owned(),
                content: Some(turn.text()).filter(|t| !t.is_empty()),
                tool_calls: turn
                    .invocations()
                    .map(|invocation| CohereToolCall {
                        id: invocation.id.clone(),
                        call_type: "function".to_owned(),
                        function: CohereFunctionCall {
                            name: invocation.name.clone(),
                            arguments: arguments_value(invocation).to_string(),
                        },
                    })
                    .collect(),
                tool_call_id: None,
            })),
            Role::ToolResult => {
                for part in &turn.parts {
                    if let Part::FunctionResponse(result) = part {
                        messages.push(CohereMessageSlot::Built(CohereMessage {
                            role: "tool".to_owned(),
                            content: Some(result.result.to_string()),
                            tool_calls: Vec::new(),
                            tool_call_id: Some(result.call_id.clone()),
                        }));
                    }
                }
            }
        }
    }

    CohereRequest {
        model: model.model_name.clone(),
        messages,
        temperature: request.options.temperature_for(model),
        p: request.options.top_p,
        max_tokens: request.options.max_tokens_for(model),
        tools: request.tools.iter().map(Into::into).collect(),
    }
}

/// Normalize a `/v2/chat` response body
///
/// The tool plan, when present, stands in for partial text.
pub fn parse_response(body: &str) -> Result<DispatchResult, LlmError> {
    let response: CohereResponse = decode(ProviderKind::Cohere, body)?;
    let message: CohereResponseMessage = decode(ProviderKind::Cohere, response.message.get())?;

    let mut text: String = message
        .content
        .iter()
        .filter(|item| item.item_type == "text")
        .filter_map(|item| item.text.as_deref())
        .collect();

    let invocations: Vec<ToolInvocation> = message
        .tool_calls
        .into_iter()
        .map(|call| ToolInvocation::with_id(call.id, call.function.name, parse_arguments(&call.function.arguments)))
        .collect();

    if text.is_empty() && !invocations.is_empty() {
        text = message.tool_plan.unwrap_or_default();
    }

    Ok(model_output(ProviderKind::Cohere, response.message, text, invocations))
}
