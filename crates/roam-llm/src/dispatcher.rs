//! Single-model dispatch
//!
//! Resolves a logical model, routes to the provider adapter, bounds every
//! call with a timeout and applies the provider's local retry policy. Models
//! whose provider is not configured get a mock answer instead of an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use roam_config::ProviderKind;

use crate::catalog::ModelCatalog;
use crate::credentials::ProviderClientPool;
use crate::error::LlmError;
use crate::provider::mock::mock_response;
use crate::retry::RetryPolicy;
use crate::types::{DispatchRequest, DispatchResult};

/// Routes one call for one logical model
pub struct Dispatcher {
    catalog: Arc<ModelCatalog>,
    pool: Arc<ProviderClientPool>,
    request_timeout: Duration,
    retry: HashMap<ProviderKind, RetryPolicy>,
}

impl Dispatcher {
    /// Dispatcher without local retries
    pub fn new(catalog: Arc<ModelCatalog>, pool: Arc<ProviderClientPool>, request_timeout: Duration) -> Self {
        Self {
            catalog,
            pool,
            request_timeout,
            retry: HashMap::new(),
        }
    }

    /// Retry transient failures of `provider` locally before giving up
    #[must_use]
    pub fn with_retry(mut self, provider: ProviderKind, policy: RetryPolicy) -> Self {
        self.retry.insert(provider, policy);
        self
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn pool(&self) -> &ProviderClientPool {
        &self.pool
    }

    /// Call `logical_model` with the given conversation
    ///
    /// # Errors
    ///
    /// [`LlmError::UnknownModel`] before any network activity if the model is
    /// not in the catalog; otherwise the classified adapter failure left over
    /// once local retries are exhausted.
    pub async fn call(&self, logical_model: &str, request: &DispatchRequest<'_>) -> Result<DispatchResult, LlmError> {
        let model = self.catalog.resolve(logical_model)?;

        if model.provider == ProviderKind::Mock || !self.pool.has_provider(model.provider) {
            tracing::debug!(model = logical_model, provider = %model.provider, "provider not configured, answering with mock");
            return Ok(DispatchResult::Mock(mock_response(logical_model, &request.last_user_text())));
        }

        let client = self.pool.get_client(model.provider)?;
        let policy = self.retry.get(&model.provider).copied().unwrap_or_else(RetryPolicy::once);
        let timeout = self.request_timeout;

        policy
            .run(logical_model, |attempt| async move {
                tracing::debug!(
                    model = logical_model,
                    provider = %model.provider,
                    upstream_model = %model.model_name,
                    attempt,
                    "dispatching"
                );

                // A fresh credential for every attempt
                let credential = client.pick_credential();
                let call = client.adapter().generate(model, request, credential.as_ref());

                match tokio::time::timeout(timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(LlmError::Transient(format!(
                        "{logical_model} timed out after {}ms",
                        timeout.as_millis()
                    ))),
                }
            })
            .await
    }
}
