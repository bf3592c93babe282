//! Bounded tool-calling loop
//!
//! Alternates between asking the model and running the tools it requests.
//! Each round appends the model's tool-call turn and then one tool-result
//! turn, in that order, before the model is asked again.

use std::sync::Arc;

use crate::error::LlmError;
use crate::fallback::{FallbackOrchestrator, Outcome};
use crate::tools::{CallerIdentity, ToolRegistry};
use crate::types::{DispatchRequest, GenerationOptions, Turn};

/// Answer used when the loop hits its ceiling without any model text
pub const REQUEST_PROCESSED: &str = "Request processed.";

/// Final answer of a tool loop run
#[derive(Debug, Clone)]
pub struct ToolLoopOutcome {
    pub text: String,
    /// Model calls made, at most the configured ceiling
    pub iterations: u32,
    /// Model behind the last successful call
    pub served_by: Option<String>,
}

/// Drives the orchestrator until the model answers in text
pub struct ToolCallLoop {
    orchestrator: Arc<FallbackOrchestrator>,
    registry: Arc<ToolRegistry>,
    max_iterations: u32,
}

impl ToolCallLoop {
    pub fn new(orchestrator: Arc<FallbackOrchestrator>, registry: Arc<ToolRegistry>, max_iterations: u32) -> Self {
        Self {
            orchestrator,
            registry,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Run the loop, appending to `transcript` in place
    ///
    /// After a fallback the remaining rounds stay on the model that served
    /// the tool call, so its raw turns are replayed to the same provider.
    /// Only the orchestrator's hard errors are returned as `Err`.
    pub async fn run(
        &self,
        transcript: &mut Vec<Turn>,
        model: &str,
        system_prompt: Option<&str>,
        options: GenerationOptions,
        caller: &CallerIdentity,
    ) -> Result<ToolLoopOutcome, LlmError> {
        let declarations = self.registry.declarations();
        let mut model = model.to_owned();
        let mut partial_text: Option<String> = None;
        let mut served_by: Option<String> = None;

        for iteration in 1..=self.max_iterations {
            let request = DispatchRequest::new(transcript.as_slice())
                .system_prompt(system_prompt)
                .tools(&declarations)
                .options(options);

            let generation = self.orchestrator.generate(&model, &request).await?;
            served_by.clone_from(&generation.served_by);

            let call = match generation.outcome {
                Outcome::Text(text) => {
                    return Ok(ToolLoopOutcome {
                        text,
                        iterations: iteration,
                        served_by,
                    });
                }
                Outcome::ToolCall(call) => call,
            };

            tracing::debug!(
                model = %model,
                iteration,
                tools = ?call.invocations.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
                "model requested tools"
            );

            if let Some(text) = call.partial_text.filter(|text| !text.trim().is_empty()) {
                partial_text = Some(text);
            }

            let results = self.registry.execute_all(&call.invocations, caller).await;
            transcript.push(call.raw_model_turn);
            transcript.push(Turn::tool_results(results));

            if let Some(serving) = generation.served_by {
                model = serving;
            }
        }

        tracing::warn!(
            model = %model,
            max_iterations = self.max_iterations,
            "tool loop hit its iteration ceiling, forcing a final answer"
        );

        Ok(ToolLoopOutcome {
            text: partial_text.unwrap_or_else(|| REQUEST_PROCESSED.to_owned()),
            iterations: self.max_iterations,
            served_by,
        })
    }
}
