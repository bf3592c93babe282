//! Provider adapter trait and HTTP implementations

pub mod anthropic;
pub mod cohere;
pub mod google;
pub mod mock;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use roam_config::ProviderKind;
use secrecy::SecretString;
use serde::Serialize;
use url::Url;

use crate::catalog::ModelConfig;
use crate::error::LlmError;
use crate::types::{DispatchRequest, DispatchResult};

/// One provider family's calling convention
///
/// Implementations map the normalized request to the provider's wire format
/// and the response back to [`DispatchResult::Text`] or
/// [`DispatchResult::ToolCall`]. Failures come back already classified as
/// [`LlmError::Transient`] or [`LlmError::Permanent`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider family served by this adapter
    fn kind(&self) -> ProviderKind;

    /// Call `model` once with the given credential
    async fn generate(
        &self,
        model: &ModelConfig,
        request: &DispatchRequest<'_>,
        credential: Option<&SecretString>,
    ) -> Result<DispatchResult, LlmError>;
}

/// Build the HTTP adapter for a configured provider
pub fn build_adapter(kind: ProviderKind, base_url: Option<Url>, client: Client) -> Result<Arc<dyn ProviderAdapter>, LlmError> {
    let adapter: Arc<dyn ProviderAdapter> = match kind {
        ProviderKind::Google => Arc::new(google::GoogleAdapter::new(client, base_url)?),
        ProviderKind::Openai | ProviderKind::Huggingface => Arc::new(openai::OpenAiAdapter::new(kind, client, base_url)?),
        ProviderKind::Anthropic => Arc::new(anthropic::AnthropicAdapter::new(client, base_url)?),
        ProviderKind::Cohere => Arc::new(cohere::CohereAdapter::new(client, base_url)?),
        ProviderKind::Ollama => Arc::new(ollama::OllamaAdapter::new(client, base_url)?),
        ProviderKind::Mock => {
            return Err(LlmError::Config("the mock provider has no HTTP adapter".to_owned()));
        }
    };
    Ok(adapter)
}

/// Configured base URL, or the provider default
fn base_url_or(configured: Option<Url>, default: &str) -> Result<Url, LlmError> {
    match configured {
        Some(url) => Ok(url),
        None => Url::parse(default).map_err(|e| LlmError::Internal(anyhow::anyhow!("invalid default URL {default}: {e}"))),
    }
}

/// Join a path onto a base URL without dropping the base path
fn endpoint(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
}

fn require_credential(kind: ProviderKind, credential: Option<&SecretString>) -> Result<&SecretString, LlmError> {
    credential.ok_or_else(|| LlmError::Permanent(format!("no API key available for {kind}")))
}

/// Send a JSON body and return the response text of a 2xx reply
///
/// Non-success statuses and transport failures are classified here, once,
/// for every adapter.
async fn post_json<T: Serialize + Sync>(kind: ProviderKind, builder: RequestBuilder, body: &T) -> Result<String, LlmError> {
    let response = builder.json(body).send().await.map_err(|e| {
        tracing::error!(provider = %kind, error = %e, "upstream request failed");
        LlmError::from(e.without_url())
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|e| LlmError::from(e.without_url()))?;

    if !status.is_success() {
        tracing::warn!(provider = %kind, status = %status, "upstream returned error");
        return Err(LlmError::upstream(Some(status), format!("{kind} returned {status}: {text}")));
    }

    Ok(text)
}
