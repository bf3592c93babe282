//! In-process adapters with scripted behaviour for unit tests

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use roam_config::ProviderKind;
use secrecy::{ExposeSecret, SecretString};

use crate::catalog::ModelConfig;
use crate::error::LlmError;
use crate::provider::ProviderAdapter;
use crate::types::{DispatchRequest, DispatchResult};

type Responder = Box<dyn Fn(&str, &DispatchRequest<'_>) -> Result<DispatchResult, LlmError> + Send + Sync>;

/// Adapter whose answers come from a closure keyed on the upstream model name
pub struct ScriptedAdapter {
    kind: ProviderKind,
    responder: Responder,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    credentials: Mutex<Vec<String>>,
    transcript_lengths: Mutex<Vec<usize>>,
}

impl ScriptedAdapter {
    pub fn new(
        kind: ProviderKind,
        responder: impl Fn(&str, &DispatchRequest<'_>) -> Result<DispatchResult, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            responder: Box::new(responder),
            delay: None,
            calls: Mutex::new(Vec::new()),
            credentials: Mutex::new(Vec::new()),
            transcript_lengths: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `text`
    pub fn replying(kind: ProviderKind, text: &str) -> Self {
        let text = text.to_owned();
        Self::new(kind, move |_, _| Ok(DispatchResult::Text(text.clone())))
    }

    /// Always fails with the error built by `error`
    pub fn failing(kind: ProviderKind, error: impl Fn() -> LlmError + Send + Sync + 'static) -> Self {
        Self::new(kind, move |_, _| Err(error()))
    }

    /// Answers only after `delay`
    pub fn slow(kind: ProviderKind, delay: Duration) -> Self {
        let mut adapter = Self::replying(kind, "late");
        adapter.delay = Some(delay);
        adapter
    }

    /// Upstream model names called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Credentials presented so far, in order
    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }

    /// Transcript length seen by each call
    pub fn transcript_lengths(&self) -> Vec<usize> {
        self.transcript_lengths.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(
        &self,
        model: &ModelConfig,
        request: &DispatchRequest<'_>,
        credential: Option<&SecretString>,
    ) -> Result<DispatchResult, LlmError> {
        self.calls.lock().unwrap().push(model.model_name.clone());
        self.transcript_lengths.lock().unwrap().push(request.transcript.len());
        if let Some(key) = credential {
            self.credentials.lock().unwrap().push(key.expose_secret().to_owned());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.responder)(&model.model_name, request)
    }
}
