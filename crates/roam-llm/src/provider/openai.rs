//! OpenAI-compatible chat completions adapter
//!
//! Serves both `OpenAI` and the Hugging Face router, which speaks the same
//! protocol under a different base URL.

use async_trait::async_trait;
use reqwest::Client;
use roam_config::ProviderKind;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ProviderAdapter, base_url_or, endpoint, post_json, require_credential};
use crate::catalog::ModelConfig;
use crate::convert::openai::{build_request, parse_response};
use crate::error::LlmError;
use crate::types::{DispatchRequest, DispatchResult};

/// Default `OpenAI` API base URL
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Hugging Face router base URL
const HUGGINGFACE_BASE_URL: &str = "https://router.huggingface.co/v1";

/// Bearer-authenticated `/chat/completions` client
pub struct OpenAiAdapter {
    kind: ProviderKind,
    client: Client,
    base_url: Url,
}

impl OpenAiAdapter {
    pub fn new(kind: ProviderKind, client: Client, base_url: Option<Url>) -> Result<Self, LlmError> {
        let default = if kind == ProviderKind::Huggingface {
            HUGGINGFACE_BASE_URL
        } else {
            OPENAI_BASE_URL
        };

        Ok(Self {
            kind,
            client,
            base_url: base_url_or(base_url, default)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(
        &self,
        model: &ModelConfig,
        request: &DispatchRequest<'_>,
        credential: Option<&SecretString>,
    ) -> Result<DispatchResult, LlmError> {
        let key = require_credential(self.kind, credential)?;
        let body = build_request(self.kind, model, request);

        let builder = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(key.expose_secret());
        let text = post_json(self.kind, builder, &body).await?;

        parse_response(self.kind, &text)
    }
}
