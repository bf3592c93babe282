//! Anthropic Messages API adapter

use async_trait::async_trait;
use reqwest::Client;
use roam_config::ProviderKind;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ProviderAdapter, base_url_or, endpoint, post_json, require_credential};
use crate::catalog::ModelConfig;
use crate::convert::anthropic::{build_request, parse_response};
use crate::error::LlmError;
use crate::protocol::anthropic::ANTHROPIC_VERSION;
use crate::types::{DispatchRequest, DispatchResult};

/// Default Anthropic API base URL
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

pub struct AnthropicAdapter {
    client: Client,
    base_url: Url,
}

impl AnthropicAdapter {
    pub fn new(client: Client, base_url: Option<Url>) -> Result<Self, LlmError> {
        Ok(Self {
            client,
            base_url: base_url_or(base_url, DEFAULT_BASE_URL)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn generate(
        &self,
        model: &ModelConfig,
        request: &DispatchRequest<'_>,
        credential: Option<&SecretString>,
    ) -> Result<DispatchResult, LlmError> {
        let key = require_credential(ProviderKind::Anthropic, credential)?;
        let body = build_request(model, request);

        let builder = self
            .client
            .post(endpoint(&self.base_url, "v1/messages"))
            .header("x-api-key", key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION);
        let text = post_json(ProviderKind::Anthropic, builder, &body).await?;

        parse_response(&text)
    }
}
