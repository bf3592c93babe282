//! Entry point for callers
//!
//! Assembles catalog, credential pool, cooldown tracker, dispatcher and
//! fallback orchestrator from configuration and exposes the two ways of
//! asking a model: a single generation and a tool-calling exchange.

use std::sync::Arc;

use indexmap::IndexMap;
use roam_config::{LlmConfig, ProviderKind};

use crate::catalog::{ModelCatalog, ModelSummary};
use crate::cooldown::CooldownTracker;
use crate::credentials::ProviderClientPool;
use crate::dispatcher::Dispatcher;
use crate::error::LlmError;
use crate::fallback::{FallbackOrchestrator, FallbackPolicy, Outcome};
use crate::retry::RetryPolicy;
use crate::tool_loop::{ToolCallLoop, ToolLoopOutcome};
use crate::tools::{CallerIdentity, ToolRegistry};
use crate::types::{DispatchRequest, GenerationOptions, ToolDeclaration, Turn};

/// Answer given when something unexpected went wrong inside the gateway
pub const INTERNAL_APOLOGY: &str = "I'm having trouble thinking right now. Could you ask again?";

/// One generation request
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Conversation to answer, oldest turn first
    pub prompt: Vec<Turn>,
    /// Logical model; the configured default when absent
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub tools: Vec<ToolDeclaration>,
    pub options: GenerationOptions,
}

impl GenerateRequest {
    /// Request for a single user message
    pub fn text(prompt: impl Into<String>) -> Self {
        Self::turns(vec![Turn::user(prompt)])
    }

    /// Request for a structured conversation
    pub fn turns(prompt: Vec<Turn>) -> Self {
        Self {
            prompt,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub const fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Configured LLM gateway
pub struct Gateway {
    catalog: Arc<ModelCatalog>,
    pool: Arc<ProviderClientPool>,
    cooldown: Arc<CooldownTracker>,
    orchestrator: Arc<FallbackOrchestrator>,
    tools: Arc<ToolRegistry>,
    tool_loop: ToolCallLoop,
    default_model: String,
    max_iterations: u32,
}

impl Gateway {
    /// Build a gateway with HTTP adapters for every configured provider
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let catalog = ModelCatalog::with_overrides(&config.models);
        let pool = ProviderClientPool::from_config(&config.providers, config.request_timeout)?;
        Self::from_parts(catalog, pool, config)
    }

    /// Build a gateway around an existing catalog and pool
    ///
    /// # Errors
    ///
    /// [`LlmError::Config`] when the default model or a Google chain entry
    /// is missing from the catalog.
    pub fn from_parts(catalog: ModelCatalog, pool: ProviderClientPool, config: &LlmConfig) -> Result<Self, LlmError> {
        if !catalog.contains(&config.default_model) {
            return Err(LlmError::Config(format!(
                "default model {} is not in the catalog",
                config.default_model
            )));
        }
        if let Some(missing) = config.fallback.google_chain.iter().find(|key| !catalog.contains(key)) {
            return Err(LlmError::Config(format!("google chain model {missing} is not in the catalog")));
        }

        let catalog = Arc::new(catalog);
        let pool = Arc::new(pool);
        let cooldown = Arc::new(CooldownTracker::new());

        let dispatcher = Dispatcher::new(Arc::clone(&catalog), Arc::clone(&pool), config.request_timeout)
            .with_retry(ProviderKind::Google, RetryPolicy::from(&config.retry));
        let orchestrator = Arc::new(FallbackOrchestrator::new(
            Arc::new(dispatcher),
            Arc::clone(&cooldown),
            FallbackPolicy::from(&config.fallback),
        ));

        let tools = Arc::new(ToolRegistry::new());
        let max_iterations = config.tool_loop.max_iterations;

        tracing::info!(
            models = catalog.len(),
            providers = ?pool.providers().map(|kind| kind.to_string()).collect::<Vec<_>>(),
            default_model = %config.default_model,
            "llm gateway ready"
        );

        Ok(Self {
            tool_loop: ToolCallLoop::new(Arc::clone(&orchestrator), Arc::clone(&tools), max_iterations),
            catalog,
            pool,
            cooldown,
            orchestrator,
            tools,
            default_model: config.default_model.clone(),
            max_iterations,
        })
    }

    /// Replace the tools offered during [`Gateway::run_with_tools`]
    #[must_use]
    pub fn with_tools(mut self, registry: ToolRegistry) -> Self {
        self.tools = Arc::new(registry);
        self.tool_loop = ToolCallLoop::new(Arc::clone(&self.orchestrator), Arc::clone(&self.tools), self.max_iterations);
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Models whose provider is configured, plus the mock entries
    pub fn available_models(&self) -> IndexMap<String, ModelSummary> {
        self.catalog.list_available(&self.pool)
    }

    /// Generate once, with fallback
    ///
    /// Tool calls are returned to the caller rather than executed.
    ///
    /// # Errors
    ///
    /// Only [`LlmError::UnknownModel`]; every other failure becomes text.
    pub async fn generate_response(&self, request: GenerateRequest) -> Result<Outcome, LlmError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let dispatch = DispatchRequest::new(&request.prompt)
            .system_prompt(request.system_prompt.as_deref())
            .tools(&request.tools)
            .options(request.options);

        match self.orchestrator.generate(model, &dispatch).await {
            Ok(generation) => Ok(generation.outcome),
            Err(e @ LlmError::UnknownModel { .. }) => Err(e),
            Err(e) => {
                tracing::error!(model, error = %e, "generation failed unexpectedly");
                Ok(Outcome::Text(INTERNAL_APOLOGY.to_owned()))
            }
        }
    }

    /// Run a tool-calling exchange with the registered tools
    ///
    /// `transcript` is extended in place with every tool round.
    ///
    /// # Errors
    ///
    /// Only [`LlmError::UnknownModel`]; every other failure becomes text.
    pub async fn run_with_tools(
        &self,
        transcript: &mut Vec<Turn>,
        model: Option<&str>,
        system_prompt: Option<&str>,
        options: GenerationOptions,
        caller: &CallerIdentity,
    ) -> Result<ToolLoopOutcome, LlmError> {
        let model = model.unwrap_or(&self.default_model);

        match self.tool_loop.run(transcript, model, system_prompt, options, caller).await {
            Ok(outcome) => Ok(outcome),
            Err(e @ LlmError::UnknownModel { .. }) => Err(e),
            Err(e) => {
                tracing::error!(model, error = %e, "tool loop failed unexpectedly");
                Ok(ToolLoopOutcome {
                    text: INTERNAL_APOLOGY.to_owned(),
                    iterations: 0,
                    served_by: None,
                })
            }
        }
    }
}
