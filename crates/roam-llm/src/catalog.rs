//! Static registry of logical model names
//!
//! Every logical model is registered once with an explicit provider tag.
//! Nothing downstream re-derives the provider from the model name.

use indexmap::IndexMap;
use roam_config::{ModelEntryConfig, ProviderKind};
use serde::Serialize;

use crate::credentials::ProviderClientPool;
use crate::error::LlmError;

/// Concrete provider binding for a logical model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Backend family
    pub provider: ProviderKind,
    /// Provider-side model identifier
    pub model_name: String,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Sampling temperature used when the caller does not supply one
    pub default_temperature: f64,
    /// Cost metadata, USD per thousand tokens
    pub cost_per_1k_tokens: f64,
    /// Whether the backend can stream this model
    pub supports_streaming: bool,
}

impl ModelConfig {
    fn builtin(provider: ProviderKind, model_name: &str, max_tokens: u32, cost_per_1k_tokens: f64) -> Self {
        Self {
            provider,
            model_name: model_name.to_owned(),
            max_tokens,
            default_temperature: 0.7,
            cost_per_1k_tokens,
            supports_streaming: true,
        }
    }
}

impl From<&ModelEntryConfig> for ModelConfig {
    fn from(entry: &ModelEntryConfig) -> Self {
        Self {
            provider: entry.provider,
            model_name: entry.model.clone(),
            max_tokens: entry.max_tokens,
            default_temperature: entry.temperature,
            cost_per_1k_tokens: entry.cost_per_1k_tokens,
            supports_streaming: entry.supports_streaming,
        }
    }
}

/// Public view of a catalog entry, as returned by [`ModelCatalog::list_available`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub provider: String,
    pub model_name: String,
    pub max_tokens: u32,
    pub cost_per_1k_tokens: f64,
    pub supports_streaming: bool,
}

/// Read-only mapping from logical model name to [`ModelConfig`]
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: IndexMap<String, ModelConfig>,
}

impl ModelCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the built-in models
    pub fn builtin() -> Self {
        use ProviderKind::{Anthropic, Cohere, Google, Huggingface, Mock, Ollama, Openai};

        let mut catalog = Self::new();
        catalog
            .register("gpt-4-turbo", ModelConfig::builtin(Openai, "gpt-4-turbo-preview", 4000, 0.03))
            .register("gpt-3.5-turbo", ModelConfig::builtin(Openai, "gpt-3.5-turbo", 4000, 0.002))
            .register("gemini-1.5-flash", ModelConfig::builtin(Google, "gemini-flash-latest", 8192, 0.0005))
            .register("gemini-1.5-pro", ModelConfig::builtin(Google, "gemini-pro-latest", 2048, 0.001))
            .register("gemini-2.0-flash", ModelConfig::builtin(Google, "gemini-2.0-flash", 8192, 0.0005))
            .register(
                "gemini-2.0-flash-lite",
                ModelConfig::builtin(Google, "gemini-2.0-flash-lite", 8192, 0.0005),
            )
            .register(
                "claude-3-sonnet",
                ModelConfig::builtin(Anthropic, "claude-3-sonnet-20240229", 4000, 0.015),
            )
            .register("command-r", ModelConfig::builtin(Cohere, "command-r", 4000, 0.0005))
            .register(
                "mistral-7b-instruct",
                ModelConfig::builtin(Huggingface, "mistralai/Mistral-7B-Instruct-v0.3", 2048, 0.0),
            )
            .register("llama3", ModelConfig::builtin(Ollama, "llama3", 2048, 0.0))
            .register("mock", ModelConfig::builtin(Mock, "mock", 2000, 0.0));
        catalog
    }

    /// Built-in catalog with configured entries added or replaced
    pub fn with_overrides(overrides: &IndexMap<String, ModelEntryConfig>) -> Self {
        let mut catalog = Self::builtin();
        for (key, entry) in overrides {
            catalog.register(key, entry.into());
        }
        catalog
    }

    /// Register or replace a logical model
    pub fn register(&mut self, key: impl Into<String>, config: ModelConfig) -> &mut Self {
        self.models.insert(key.into(), config);
        self
    }

    /// Look up a logical model name
    pub fn resolve(&self, logical_name: &str) -> Result<&ModelConfig, LlmError> {
        self.models.get(logical_name).ok_or_else(|| LlmError::UnknownModel {
            model: logical_name.to_owned(),
        })
    }

    pub fn contains(&self, logical_name: &str) -> bool {
        self.models.contains_key(logical_name)
    }

    /// Iterate over all entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelConfig)> {
        self.models.iter().map(|(key, config)| (key.as_str(), config))
    }

    /// Logical names served by one provider, in registration order
    pub fn keys_for(&self, provider: ProviderKind) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(move |(_, config)| config.provider == provider)
            .map(|(key, _)| key)
    }

    /// Entries whose provider is configured in `pool`, plus every mock entry
    pub fn list_available(&self, pool: &ProviderClientPool) -> IndexMap<String, ModelSummary> {
        self.iter()
            .filter(|(_, config)| config.provider == ProviderKind::Mock || pool.has_provider(config.provider))
            .map(|(key, config)| {
                (
                    key.to_owned(),
                    ModelSummary {
                        provider: config.provider.to_string(),
                        model_name: config.model_name.clone(),
                        max_tokens: config.max_tokens,
                        cost_per_1k_tokens: config.cost_per_1k_tokens,
                        supports_streaming: config.supports_streaming,
                    },
                )
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;

    use super::*;
    use crate::testing::ScriptedAdapter;

    #[test]
    fn resolve_is_idempotent() {
        let catalog = ModelCatalog::builtin();
        let first = catalog.resolve("gemini-1.5-flash").unwrap().clone();
        let second = catalog.resolve("gemini-1.5-flash").unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.model_name, "gemini-flash-latest");
        assert_eq!(first.provider, ProviderKind::Google);
    }

    #[test]
    fn unknown_model_fails() {
        let err = ModelCatalog::builtin().resolve("gpt-7").unwrap_err();
        assert!(matches!(err, LlmError::UnknownModel { model } if model == "gpt-7"));
    }

    #[test]
    fn overrides_replace_builtin_entries() {
        let mut overrides = IndexMap::new();
        overrides.insert(
            "gpt-3.5-turbo".to_owned(),
            ModelEntryConfig {
                provider: ProviderKind::Openai,
                model: "gpt-4o-mini".to_owned(),
                max_tokens: 1000,
                temperature: 0.2,
                cost_per_1k_tokens: 0.00015,
                supports_streaming: false,
            },
        );

        let catalog = ModelCatalog::with_overrides(&overrides);
        let entry = catalog.resolve("gpt-3.5-turbo").unwrap();
        assert_eq!(entry.model_name, "gpt-4o-mini");
        assert_eq!(entry.max_tokens, 1000);
        assert_eq!(catalog.len(), ModelCatalog::builtin().len());
    }

    #[test]
    fn keys_for_preserves_registration_order() {
        let catalog = ModelCatalog::builtin();
        let google: Vec<&str> = catalog.keys_for(ProviderKind::Google).collect();
        assert_eq!(
            google,
            vec!["gemini-1.5-flash", "gemini-1.5-pro", "gemini-2.0-flash", "gemini-2.0-flash-lite"]
        );
    }

    #[test]
    fn list_available_only_includes_configured_providers_and_mock() {
        let catalog = ModelCatalog::builtin();
        let mut pool = ProviderClientPool::new();
        pool.insert(
            ProviderKind::Anthropic,
            Arc::new(ScriptedAdapter::replying(ProviderKind::Anthropic, "hi")),
            vec![SecretString::from("sk-ant")],
        );

        let available = catalog.list_available(&pool);
        let keys: Vec<&str> = available.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["claude-3-sonnet", "mock"]);
        assert_eq!(available["claude-3-sonnet"].provider, "anthropic");
        assert_eq!(available["claude-3-sonnet"].model_name, "claude-3-sonnet-20240229");
    }
}
