use super::tool::ToolDeclaration;
use super::transcript::Turn;
use crate::catalog::ModelConfig;

/// Caller-supplied sampling overrides
///
/// Absent values fall back to the catalog entry or a provider default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Temperature to send, falling back to the model default
    pub fn temperature_for(&self, model: &ModelConfig) -> f64 {
        self.temperature.unwrap_or(model.default_temperature)
    }

    /// Output token cap to send, falling back to the model maximum
    pub fn max_tokens_for(&self, model: &ModelConfig) -> u32 {
        self.max_tokens.unwrap_or(model.max_tokens)
    }
}

/// Everything the dispatcher needs for one model call
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    /// Conversation so far, oldest first
    pub transcript: &'a [Turn],
    pub system_prompt: Option<&'a str>,
    /// Tools offered to the model; empty disables function calling
    pub tools: &'a [ToolDeclaration],
    pub options: GenerationOptions,
}

impl<'a> DispatchRequest<'a> {
    pub const fn new(transcript: &'a [Turn]) -> Self {
        Self {
            transcript,
            system_prompt: None,
            tools: &[],
            options: GenerationOptions {
                temperature: None,
                top_p: None,
                max_tokens: None,
            },
        }
    }

    #[must_use]
    pub const fn system_prompt(mut self, prompt: Option<&'a str>) -> Self {
        self.system_prompt = prompt;
        self
    }

    #[must_use]
    pub const fn tools(mut self, tools: &'a [ToolDeclaration]) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub const fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Text of the most recent user turn
    pub fn last_user_text(&self) -> String {
        self.transcript
            .iter()
            .rev()
            .find(|turn| turn.role == super::Role::User)
            .map(Turn::text)
            .unwrap_or_default()
    }
}
