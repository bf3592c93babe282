//! Cross-model fallback
//!
//! Wraps the [`Dispatcher`]. When a model fails transiently it goes into
//! cooldown and the orchestrator moves to the next candidate: same-provider
//! siblings first, then other providers in priority order. Every hop adds
//! the model to a tried-set that only grows, so the walk visits each
//! catalog entry at most once.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use roam_config::{FallbackConfig, ProviderKind};

use crate::cooldown::CooldownTracker;
use crate::dispatcher::Dispatcher;
use crate::error::LlmError;
use crate::types::{DispatchRequest, DispatchResult, ToolCallResult};

/// Answer returned once every candidate has failed transiently
pub const EXHAUSTED_MESSAGE: &str = "I'm currently receiving too many requests or my API quota is exhausted. \
     Please try again in a few minutes or try a shorter message.";

/// Answer returned for a failure that retrying cannot fix
pub fn permanent_failure_message(model: &str, error: &LlmError) -> String {
    format!("AI Error ({model}): {error}. Please check your API key.")
}

/// Terminal result of one fallback walk
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Final text, including mock and degraded answers
    Text(String),
    /// The serving model asked for tools to run
    ToolCall(ToolCallResult),
}

impl From<DispatchResult> for Outcome {
    fn from(result: DispatchResult) -> Self {
        match result {
            DispatchResult::Text(text) | DispatchResult::Mock(text) => Self::Text(text),
            DispatchResult::ToolCall(call) => Self::ToolCall(call),
        }
    }
}

/// Outcome plus the trail that led to it
#[derive(Debug, Clone)]
pub struct Generation {
    pub outcome: Outcome,
    /// Model that produced the outcome; `None` for degraded answers
    pub served_by: Option<String>,
    /// Models attempted, in order, each exactly once
    pub attempted: Vec<String>,
}

impl Generation {
    fn degraded(text: String, attempted: IndexSet<String>) -> Self {
        Self {
            outcome: Outcome::Text(text),
            served_by: None,
            attempted: attempted.into_iter().collect(),
        }
    }
}

/// Fallback ordering and cooldown settings
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    /// Fall back from every provider, not only Google
    pub symmetric: bool,
    /// Declared order of Google siblings
    pub google_chain: Vec<String>,
    /// Order in which providers are visited
    pub provider_priority: Vec<ProviderKind>,
    pub cooldown: Duration,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::from(&FallbackConfig::default())
    }
}

impl From<&FallbackConfig> for FallbackPolicy {
    fn from(config: &FallbackConfig) -> Self {
        Self {
            symmetric: config.symmetric,
            google_chain: config.google_chain.clone(),
            provider_priority: config.provider_priority.clone(),
            cooldown: config.cooldown,
        }
    }
}

/// Walks fallback candidates until one model answers
pub struct FallbackOrchestrator {
    dispatcher: Arc<Dispatcher>,
    cooldown: Arc<CooldownTracker>,
    policy: FallbackPolicy,
}

impl FallbackOrchestrator {
    pub fn new(dispatcher: Arc<Dispatcher>, cooldown: Arc<CooldownTracker>, policy: FallbackPolicy) -> Self {
        Self {
            dispatcher,
            cooldown,
            policy,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Generate with `requested_model`, falling back on transient failures
    ///
    /// Transient and permanent provider failures end in a normal
    /// [`Outcome::Text`]. Only an unknown model and internal errors are
    /// returned as `Err`.
    pub async fn generate(&self, requested_model: &str, request: &DispatchRequest<'_>) -> Result<Generation, LlmError> {
        self.dispatcher.catalog().resolve(requested_model)?;

        let mut tried: IndexSet<String> = IndexSet::new();
        let mut current = requested_model.to_owned();

        // Cooldown is only honoured before the first attempt; once the walk
        // is underway every remaining candidate stays reachable.
        if self.cooldown.is_cooling(&current)
            && let Some(substitute) = self.next_candidate(&current, &tried, true)
        {
            tracing::info!(
                requested = %current,
                substitute = %substitute,
                "requested model is cooling down, starting with substitute"
            );
            current = substitute;
        }

        loop {
            tried.insert(current.clone());

            match self.dispatcher.call(&current, request).await {
                Ok(result) => {
                    if tried.len() > 1 {
                        tracing::info!(model = %current, hops = tried.len() - 1, "fallback candidate answered");
                    }
                    return Ok(Generation {
                        outcome: result.into(),
                        served_by: Some(current),
                        attempted: tried.into_iter().collect(),
                    });
                }
                Err(e) if e.is_retryable() => {
                    self.cooldown.mark_unavailable(&current, self.policy.cooldown);

                    let Some(next) = self.next_candidate(&current, &tried, false) else {
                        tracing::warn!(
                            model = %current,
                            attempted = tried.len(),
                            error = %e,
                            "all fallback candidates exhausted"
                        );
                        return Ok(Generation::degraded(EXHAUSTED_MESSAGE.to_owned(), tried));
                    };

                    tracing::warn!(
                        from_model = %current,
                        to_model = %next,
                        attempt = tried.len(),
                        error = %e,
                        "transient failure, falling back"
                    );
                    current = next;
                }
                Err(e @ (LlmError::UnknownModel { .. } | LlmError::Internal(_))) => return Err(e),
                Err(e) => {
                    tracing::error!(model = %current, error = %e, "provider failed permanently");
                    return Ok(Generation::degraded(permanent_failure_message(&current, &e), tried));
                }
            }
        }
    }

    /// Fallback order after `failed`, before filtering
    ///
    /// Same-provider siblings come first, then every provider in priority
    /// order. In legacy mode only Google models fall back at all.
    fn candidate_order(&self, failed: &str) -> Vec<&str> {
        let Ok(model) = self.dispatcher.catalog().resolve(failed) else {
            return Vec::new();
        };

        if !self.policy.symmetric && model.provider != ProviderKind::Google {
            return Vec::new();
        }

        let mut order = self.provider_models(model.provider);
        for kind in &self.policy.provider_priority {
            if *kind != model.provider {
                order.extend(self.provider_models(*kind));
            }
        }
        order
    }

    /// Models of one provider: the declared chain for Google, then catalog order
    fn provider_models(&self, kind: ProviderKind) -> Vec<&str> {
        let catalog = self.dispatcher.catalog();
        let mut models: Vec<&str> = Vec::new();
        if kind == ProviderKind::Google {
            models.extend(self.policy.google_chain.iter().map(String::as_str));
        }
        models.extend(catalog.keys_for(kind));
        models
    }

    /// First untried, reachable candidate after `failed`
    fn next_candidate(&self, failed: &str, tried: &IndexSet<String>, skip_cooling: bool) -> Option<String> {
        self.candidate_order(failed)
            .into_iter()
            .filter(|key| *key != failed && !tried.contains(*key))
            .filter(|key| self.is_reachable(key))
            .find(|key| !(skip_cooling && self.cooldown.is_cooling(key)))
            .map(str::to_owned)
    }

    /// Real (non-mock) model whose provider is configured
    fn is_reachable(&self, key: &str) -> bool {
        self.dispatcher
            .catalog()
            .resolve(key)
            .is_ok_and(|model| model.provider != ProviderKind::Mock && self.dispatcher.pool().has_provider(model.provider))
    }
}
