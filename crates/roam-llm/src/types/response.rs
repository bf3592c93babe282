use super::tool::ToolInvocation;
use super::transcript::Turn;

/// Normalized outcome of one dispatcher call
#[derive(Debug, Clone)]
pub enum DispatchResult {
    /// Final text answer
    Text(String),
    /// Model asked for tools to run before answering
    ToolCall(ToolCallResult),
    /// Placeholder answer for a model whose provider is not configured
    Mock(String),
}

/// Tool-call request returned by a provider
#[derive(Debug, Clone)]
pub struct ToolCallResult {
    pub invocations: Vec<ToolInvocation>,
    /// Model turn to append to the transcript before the tool results,
    /// carrying the provider payload verbatim
    pub raw_model_turn: Turn,
    /// Any text the model emitted alongside the calls
    pub partial_text: Option<String>,
}
