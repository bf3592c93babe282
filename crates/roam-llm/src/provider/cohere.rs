//! Cohere v2 chat adapter

use async_trait::async_trait;
use reqwest::Client;
use roam_config::ProviderKind;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ProviderAdapter, base_url_or, endpoint, post_json, require_credential};
use crate::catalog::ModelConfig;
use crate::convert::cohere::{build_request, parse_response};
use crate::error::LlmError;
use crate::types::{DispatchRequest, DispatchResult};

const DEFAULT_BASE_URL: &str = "https://api.cohere.com";

pub struct CohereAdapter {
    client: Client,
    base_url: Url,
}

impl CohereAdapter {
    pub fn new(client: Client, base_url: Option<Url>) -> Result<Self, LlmError> {
        Ok(Self {
            client,
            base_url: base_url_or(base_url, DEFAULT_BASE_URL)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for CohereAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cohere
    }

    async fn generate(
        &self,
        model: &ModelConfig,
        request: &DispatchRequest<'_>,
        credential: Option<&SecretString>,
    ) -> Result<DispatchResult, LlmError> {
        let key = require_credential(ProviderKind::Cohere, credential)?;
        let body = build_request(model, request);

        let builder = self
            .client
            .post(endpoint(&self.base_url, "v2/chat"))
            .bearer_auth(key.expose_secret());
        let text = post_json(ProviderKind::Cohere, builder, &body).await?;

        parse_response(&text)
    }
}
