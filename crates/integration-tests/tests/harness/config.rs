//! Programmatic configuration builder for integration tests

use std::time::Duration;

use roam_config::{LlmConfig, ProviderConfig, ProviderKind};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: LlmConfig,
}

impl ConfigBuilder {
    /// Defaults with fast retries and a short request timeout
    pub fn new() -> Self {
        let mut config = LlmConfig::default();
        config.request_timeout = Duration::from_secs(5);
        config.retry.base_delay = Duration::from_millis(1);
        Self { config }
    }

    /// Point a provider at a mock backend with the given comma-separated keys
    pub fn with_provider(mut self, kind: ProviderKind, base_url: &str, keys: &str) -> Self {
        if let Some(slot) = self.config.providers.slot_mut(kind) {
            *slot = Some(ProviderConfig {
                api_key: Some(SecretString::from(keys)),
                base_url: Some(base_url.parse().expect("valid URL")),
            });
        }
        self
    }

    pub fn with_default_model(mut self, model: &str) -> Self {
        model.clone_into(&mut self.config.default_model);
        self
    }

    /// Restrict fallback to Google-served models
    pub fn with_legacy_fallback(mut self) -> Self {
        self.config.fallback.symmetric = false;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.config.tool_loop.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> LlmConfig {
        self.config
    }
}
