//! Local Ollama adapter; needs no credential

use async_trait::async_trait;
use reqwest::Client;
use roam_config::ProviderKind;
use secrecy::SecretString;
use url::Url;

use super::{ProviderAdapter, base_url_or, endpoint, post_json};
use crate::catalog::ModelConfig;
use crate::convert::ollama::{build_request, parse_response};
use crate::error::LlmError;
use crate::types::{DispatchRequest, DispatchResult};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaAdapter {
    client: Client,
    base_url: Url,
}

impl OllamaAdapter {
    pub fn new(client: Client, base_url: Option<Url>) -> Result<Self, LlmError> {
        Ok(Self {
            client,
            base_url: base_url_or(base_url, DEFAULT_BASE_URL)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate(
        &self,
        model: &ModelConfig,
        request: &DispatchRequest<'_>,
        _credential: Option<&SecretString>,
    ) -> Result<DispatchResult, LlmError> {
        let body = build_request(model, request);
        let builder = self.client.post(endpoint(&self.base_url, "api/chat"));
        let text = post_json(ProviderKind::Ollama, builder, &body).await?;

        parse_response(&text)
    }
}
