//! Server-side tools the model may call
//!
//! Tools are registered by name together with the declaration offered to the
//! model. Execution never fails outward: unknown names, bad arguments, tool
//! errors and panics all come back as `{"error": ...}` payloads the model can
//! read on its next turn.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{ToolDeclaration, ToolInvocation, ToolResult};

/// Argument key the caller's identity is injected under
pub const USER_ID_ARGUMENT: &str = "user_id";

/// Payload returned for a call naming an unregistered tool
pub const UNKNOWN_TOOL: &str = "unknown tool";

/// Who the tools are running on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }
}

/// Failure reported by a tool implementation
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not match what the tool expects
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool ran and failed
    #[error("{0}")]
    Failed(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Callable exposed to the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declaration offered to the model
    fn declaration(&self) -> &ToolDeclaration;

    /// Run with the model's arguments plus the injected caller identity
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

/// [`Tool`] backed by an async closure
pub struct FnTool<F> {
    declaration: ToolDeclaration,
    handler: F,
}

impl<F, Fut> FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send,
{
    pub const fn new(declaration: ToolDeclaration, handler: F) -> Self {
        Self { declaration, handler }
    }
}

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send,
{
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        (self.handler)(arguments).await
    }
}

/// Name-keyed set of tools, in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any earlier one with the same name
    pub fn register(&mut self, tool: impl Tool + 'static) -> &mut Self {
        let name = tool.declaration().name.clone();
        if self.tools.insert(name.clone(), Arc::new(tool)).is_some() {
            tracing::warn!(tool = %name, "tool registered twice, keeping the latest");
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Declarations to offer the model
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.values().map(|tool| tool.declaration().clone()).collect()
    }

    /// Run one invocation on behalf of `caller`
    ///
    /// The caller's identity overrides any `user_id` the model supplied.
    /// The tool runs on its own task so a panic is contained and reported
    /// like any other failure.
    pub async fn execute(&self, invocation: &ToolInvocation, caller: &CallerIdentity) -> ToolResult {
        let Some(tool) = self.tools.get(&invocation.name).cloned() else {
            tracing::warn!(tool = %invocation.name, "model requested unknown tool");
            return ToolResult::error(invocation, UNKNOWN_TOOL);
        };

        let mut arguments = invocation.arguments.clone();
        arguments.insert(USER_ID_ARGUMENT.to_owned(), Value::String(caller.user_id.clone()));

        let outcome = tokio::spawn(async move { tool.call(arguments).await }).await;

        match outcome {
            Ok(Ok(value)) => {
                tracing::debug!(tool = %invocation.name, call_id = %invocation.id, "tool succeeded");
                ToolResult::ok(invocation, value)
            }
            Ok(Err(e)) => {
                tracing::warn!(tool = %invocation.name, error = %e, "tool failed");
                ToolResult::error(invocation, e.to_string())
            }
            Err(e) => {
                tracing::error!(tool = %invocation.name, error = %e, "tool task aborted");
                let message = if e.is_panic() { "tool panicked" } else { "tool was cancelled" };
                ToolResult::error(invocation, message)
            }
        }
    }

    /// Run invocations one after another, in the order the model gave them
    pub async fn execute_all(&self, invocations: &[ToolInvocation], caller: &CallerIdentity) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            results.push(self.execute(invocation, caller).await);
        }
        results
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn declaration(name: &str) -> ToolDeclaration {
        ToolDeclaration {
            name: name.to_owned(),
            description: format!("{name} tool"),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(FnTool::new(declaration("echo_args"), |args| async move {
                Ok(Value::Object(args))
            }))
            .register(FnTool::new(declaration("always_fails"), |_| async {
                Err(ToolError::Failed("trip not found".into()))
            }))
            .register(Panicking(declaration("panics")));
        registry
    }

    struct Panicking(ToolDeclaration);

    #[async_trait]
    impl Tool for Panicking {
        fn declaration(&self) -> &ToolDeclaration {
            &self.0
        }

        async fn call(&self, _arguments: Map<String, Value>) -> Result<Value, ToolError> {
            panic!("boom")
        }
    }

    #[test]
    fn declarations_keep_registration_order() {
        let names: Vec<String> = registry().declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo_args", "always_fails", "panics"]);
    }

    #[tokio::test]
    async fn caller_identity_overrides_model_supplied_user() {
        let invocation = ToolInvocation::new("echo_args", json!({"user_id": "someone-else", "city": "Porto"}));

        let result = registry().execute(&invocation, &CallerIdentity::new("user-42")).await;

        assert_eq!(result.result, json!({"user_id": "user-42", "city": "Porto"}));
        assert_eq!(result.call_id, invocation.id);
    }

    #[tokio::test]
    async fn unknown_tool_yields_error_payload() {
        let invocation = ToolInvocation::new("book_flight", json!({}));

        let result = registry().execute(&invocation, &CallerIdentity::new("u")).await;

        assert_eq!(result.result, json!({"error": "unknown tool"}));
        assert_eq!(result.tool_name, "book_flight");
    }

    #[tokio::test]
    async fn tool_failure_becomes_error_payload() {
        let invocation = ToolInvocation::new("always_fails", json!({}));

        let result = registry().execute(&invocation, &CallerIdentity::new("u")).await;

        assert_eq!(result.result, json!({"error": "trip not found"}));
    }

    #[tokio::test]
    async fn panicking_tool_is_contained() {
        let invocation = ToolInvocation::new("panics", json!({}));

        let result = registry().execute(&invocation, &CallerIdentity::new("u")).await;

        assert!(result.is_error());
        assert_eq!(result.result, json!({"error": "tool panicked"}));
    }

    #[test]
    fn release_profile_unwinds() {
        let manifest: toml::Value = toml::from_str(include_str!("../../../Cargo.toml")).unwrap();
        let release = &manifest["profile"]["release"];

        assert_ne!(release.get("panic").and_then(|v| v.as_str()), Some("abort"));
    }

    #[tokio::test]
    async fn execute_all_preserves_order() {
        let invocations = vec![
            ToolInvocation::with_id("a", "always_fails", json!({})),
            ToolInvocation::with_id("b", "echo_args", json!({})),
            ToolInvocation::with_id("c", "missing", json!({})),
        ];

        let results = registry().execute_all(&invocations, &CallerIdentity::new("u")).await;

        let ids: Vec<&str> = results.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(!results[1].is_error());
    }
}
