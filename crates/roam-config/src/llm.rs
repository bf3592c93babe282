use std::time::Duration;

use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use strum::{Display, EnumIter, EnumString};
use url::Url;

/// Top-level LLM gateway configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Logical model used when a caller does not name one
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Upper bound on a single provider call
    #[serde(default = "default_request_timeout", deserialize_with = "duration_str::deserialize_duration")]
    pub request_timeout: Duration,
    /// Provider credentials and endpoints
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Extra or replacement catalog entries keyed by logical model name
    #[serde(default)]
    pub models: IndexMap<String, ModelEntryConfig>,
    /// Cross-model fallback policy
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Same-model retry applied to Google calls
    #[serde(default)]
    pub retry: RetryConfig,
    /// Tool-calling loop bounds
    #[serde(default)]
    pub tool_loop: ToolLoopConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            request_timeout: default_request_timeout(),
            providers: ProvidersConfig::default(),
            models: IndexMap::new(),
            fallback: FallbackConfig::default(),
            retry: RetryConfig::default(),
            tool_loop: ToolLoopConfig::default(),
        }
    }
}

/// Backend family a logical model is served by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    /// `OpenAI` chat completions
    Openai,
    /// Google Generative Language API
    Google,
    /// Anthropic Messages API
    Anthropic,
    /// Cohere v2 chat
    Cohere,
    /// Hugging Face OpenAI-compatible router
    Huggingface,
    /// Local Ollama server
    Ollama,
    /// Built-in placeholder responder
    Mock,
}

impl ProviderKind {
    /// Whether a configured provider of this kind needs an API key
    pub const fn requires_credential(self) -> bool {
        !matches!(self, Self::Ollama | Self::Mock)
    }
}

/// Per-provider configuration blocks
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Google Generative Language API
    #[serde(default)]
    pub google: Option<ProviderConfig>,
    /// `OpenAI`
    #[serde(default)]
    pub openai: Option<ProviderConfig>,
    /// Anthropic
    #[serde(default)]
    pub anthropic: Option<ProviderConfig>,
    /// Cohere
    #[serde(default)]
    pub cohere: Option<ProviderConfig>,
    /// Hugging Face router
    #[serde(default)]
    pub huggingface: Option<ProviderConfig>,
    /// Ollama
    #[serde(default)]
    pub ollama: Option<ProviderConfig>,
}

impl ProvidersConfig {
    /// Iterate over the configured providers
    pub fn iter(&self) -> impl Iterator<Item = (ProviderKind, &ProviderConfig)> {
        [
            (ProviderKind::Google, self.google.as_ref()),
            (ProviderKind::Openai, self.openai.as_ref()),
            (ProviderKind::Anthropic, self.anthropic.as_ref()),
            (ProviderKind::Cohere, self.cohere.as_ref()),
            (ProviderKind::Huggingface, self.huggingface.as_ref()),
            (ProviderKind::Ollama, self.ollama.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, config)| config.map(|c| (kind, c)))
    }

    /// Mutable slot for a provider kind, `None` for `Mock`
    pub fn slot_mut(&mut self, kind: ProviderKind) -> Option<&mut Option<ProviderConfig>> {
        match kind {
            ProviderKind::Google => Some(&mut self.google),
            ProviderKind::Openai => Some(&mut self.openai),
            ProviderKind::Anthropic => Some(&mut self.anthropic),
            ProviderKind::Cohere => Some(&mut self.cohere),
            ProviderKind::Huggingface => Some(&mut self.huggingface),
            ProviderKind::Ollama => Some(&mut self.ollama),
            ProviderKind::Mock => None,
        }
    }
}

/// Credentials and endpoint for a single provider
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key, or several comma-separated keys for rotation
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
}

impl ProviderConfig {
    /// Split the configured key string into individual credentials
    ///
    /// Blank entries are dropped, so `"a,,b "` yields two keys.
    pub fn credentials(&self) -> Vec<SecretString> {
        self.api_key
            .as_ref()
            .map(|raw| {
                raw.expose_secret()
                    .split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(|key| SecretString::from(key.to_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A catalog entry declared in configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntryConfig {
    /// Backend family serving the model
    pub provider: ProviderKind,
    /// Provider-side model identifier
    pub model: String,
    /// Maximum output tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Cost metadata in USD per thousand tokens
    #[serde(default)]
    pub cost_per_1k_tokens: f64,
    /// Whether the backend can stream this model
    #[serde(default = "default_true")]
    pub supports_streaming: bool,
}

/// Cross-model fallback policy
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackConfig {
    /// Walk sibling and cross-provider candidates after a transient failure on
    /// any provider. When `false`, only Google-served models fall back.
    #[serde(default = "default_true")]
    pub symmetric: bool,
    /// Declared order of Google siblings
    #[serde(default = "default_google_chain")]
    pub google_chain: Vec<String>,
    /// Order in which other providers are tried
    #[serde(default = "default_provider_priority")]
    pub provider_priority: Vec<ProviderKind>,
    /// How long a model is deprioritised after a transient failure
    #[serde(default = "default_cooldown", deserialize_with = "duration_str::deserialize_duration")]
    pub cooldown: Duration,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            symmetric: true,
            google_chain: default_google_chain(),
            provider_priority: default_provider_priority(),
            cooldown: default_cooldown(),
        }
    }
}

/// Same-model retry with exponential backoff
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt, doubled for each one after
    #[serde(default = "default_retry_delay", deserialize_with = "duration_str::deserialize_duration")]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            base_delay: default_retry_delay(),
        }
    }
}

/// Tool-calling loop bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolLoopConfig {
    /// Model calls allowed before the loop forces a final answer
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for ToolLoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_model() -> String {
    "gemini-1.5-flash".to_owned()
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

const fn default_max_tokens() -> u32 {
    2000
}

const fn default_temperature() -> f64 {
    0.7
}

const fn default_true() -> bool {
    true
}

fn default_google_chain() -> Vec<String> {
    ["gemini-2.0-flash-lite", "gemini-1.5-flash", "gemini-2.0-flash", "gemini-1.5-pro"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

fn default_provider_priority() -> Vec<ProviderKind> {
    vec![
        ProviderKind::Google,
        ProviderKind::Openai,
        ProviderKind::Anthropic,
        ProviderKind::Cohere,
        ProviderKind::Huggingface,
        ProviderKind::Ollama,
    ]
}

const fn default_cooldown() -> Duration {
    Duration::from_secs(60)
}

const fn default_retry_attempts() -> u32 {
    3
}

const fn default_retry_delay() -> Duration {
    Duration::from_secs(2)
}

const fn default_max_iterations() -> u32 {
    5
}
