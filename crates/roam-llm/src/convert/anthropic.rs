//! Conversion between the normalized transcript and Anthropic wire format

use roam_config::ProviderKind;

use super::{arguments_value, decode, model_output};
use crate::catalog::ModelConfig;
use crate::error::LlmError;
use crate::protocol::anthropic::{
    AnthropicBlock, AnthropicMessage, AnthropicMessageSlot, AnthropicRequest, AnthropicResponse, AnthropicTool,
};
use crate::types::{DispatchRequest, DispatchResult, Part, Role, ToolInvocation, Turn};

/// Build a Messages API request
pub fn build_request<'a>(model: &ModelConfig, request: &DispatchRequest<'a>) -> AnthropicRequest<'a> {
    let transcript: &'a [Turn] = request.transcript;
    let messages = transcript
        .iter()
        .map(|turn| match turn.raw_for(ProviderKind::Anthropic) {
            Some(content) => AnthropicMessageSlot::Raw {
                role: "assistant",
                content,
            },
            None => AnthropicMessageSlot::Built(turn_to_message(turn)),
        })
        .collect();

    AnthropicRequest {
        model: model.model_name.clone(),
        max_tokens: request.options.max_tokens_for(model),
        system: request.system_prompt.map(str::to_owned),
        messages,
        temperature: request.options.temperature_for(model),
        top_p: request.options.top_p,
        tools: request
            .tools
            .iter()
            .map(|tool| AnthropicTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.parameters.clone(),
            })
            .collect(),
    }
}

fn turn_to_message(turn: &Turn) -> AnthropicMessage {
    let role = match turn.role {
        Role::Model => "assistant",
        Role::User | Role::ToolResult => "user",
    };

    let content = turn
        .parts
        .iter()
        .filter_map(|part| match part {
            Part::Text(text) if text.is_empty() => None,
            Part::Text(text) => Some(AnthropicBlock::Text { text: text.clone() }),
            Part::FunctionCall(invocation) => Some(AnthropicBlock::ToolUse {
                id: invocation.id.clone(),
                name: invocation.name.clone(),
                input: arguments_value(invocation),
            }),
            Part::FunctionResponse(result) => Some(AnthropicBlock::ToolResult {
                tool_use_id: result.call_id.clone(),
                content: result.result.to_string(),
                is_error: result.is_error(),
            }),
        })
        .collect();

    AnthropicMessage {
        role: role.to_owned(),
        content,
    }
}

/// Normalize a Messages API response body
pub fn parse_response(body: &str) -> Result<DispatchResult, LlmError> {
    let response: AnthropicResponse = decode(ProviderKind::Anthropic, body)?;
    let blocks: Vec<AnthropicBlock> = decode(ProviderKind::Anthropic, response.content.get())?;

    let mut text = String::new();
    let mut invocations = Vec::new();
    for block in blocks {
        match block {
            AnthropicBlock::Text { text: fragment } => text.push_str(&fragment),
            AnthropicBlock::ToolUse { id, name, input } => invocations.push(ToolInvocation::with_id(id, name, input)),
            AnthropicBlock::ToolResult { .. } | AnthropicBlock::Other => {}
        }
    }

    Ok(model_output(ProviderKind::Anthropic, response.content, text, invocations))
}
