//! Google Generative Language API adapter

use async_trait::async_trait;
use reqwest::Client;
use roam_config::ProviderKind;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ProviderAdapter, base_url_or, endpoint, post_json, require_credential};
use crate::catalog::ModelConfig;
use crate::convert::google::{build_request, parse_response};
use crate::error::LlmError;
use crate::types::{DispatchRequest, DispatchResult};

/// Default Google Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Calls `models/{model}:generateContent` with the key as a query parameter
pub struct GoogleAdapter {
    client: Client,
    base_url: Url,
}

impl GoogleAdapter {
    pub fn new(client: Client, base_url: Option<Url>) -> Result<Self, LlmError> {
        Ok(Self {
            client,
            base_url: base_url_or(base_url, DEFAULT_BASE_URL)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn generate(
        &self,
        model: &ModelConfig,
        request: &DispatchRequest<'_>,
        credential: Option<&SecretString>,
    ) -> Result<DispatchResult, LlmError> {
        let key = require_credential(ProviderKind::Google, credential)?;
        let url = endpoint(&self.base_url, &format!("models/{}:generateContent", model.model_name));
        let body = build_request(model, request);

        let builder = self
            .client
            .post(url)
            .query(&[("key", key.expose_secret())]);
        let text = post_json(ProviderKind::Google, builder, &body).await?;

        parse_response(&text)
    }
}
