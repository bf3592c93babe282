//! Per-provider credentials and adapter handles
//!
//! Built once at startup. Providers that accept several API keys rotate
//! between them through a pluggable [`SelectionStrategy`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;
use roam_config::{ProviderKind, ProvidersConfig};
use secrecy::SecretString;

use crate::error::LlmError;
use crate::provider::{self, ProviderAdapter};

/// Picks which of `len` credentials serves the next call
pub trait SelectionStrategy: Send + Sync {
    /// Return an index in `0..len`; `len` is never zero
    fn select(&self, len: usize) -> usize;
}

/// Uniform random selection
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelection;

impl SelectionStrategy for RandomSelection {
    fn select(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Cycles through credentials in load order
#[derive(Debug, Default)]
pub struct RoundRobinSelection {
    next: AtomicUsize,
}

impl SelectionStrategy for RoundRobinSelection {
    fn select(&self, len: usize) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed) % len
    }
}

/// Immutable set of credentials for one provider
pub struct CredentialPool {
    credentials: Vec<SecretString>,
    strategy: Arc<dyn SelectionStrategy>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<SecretString>, strategy: Arc<dyn SelectionStrategy>) -> Self {
        Self { credentials, strategy }
    }

    /// Select a credential, `None` when the pool is empty
    ///
    /// Every call selects independently of the previous one.
    pub fn pick(&self) -> Option<SecretString> {
        if self.credentials.is_empty() {
            return None;
        }
        let index = self.strategy.select(self.credentials.len());
        self.credentials.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

/// Handle used by the dispatcher to reach one provider
#[derive(Clone)]
pub struct ProviderClient {
    kind: ProviderKind,
    adapter: Arc<dyn ProviderAdapter>,
    credentials: Arc<CredentialPool>,
}

impl ProviderClient {
    pub const fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn adapter(&self) -> &dyn ProviderAdapter {
        self.adapter.as_ref()
    }

    /// Select a credential for the next call
    pub fn pick_credential(&self) -> Option<SecretString> {
        self.credentials.pick()
    }
}

/// Builds a fresh strategy for each provider's credentials
pub type StrategyFactory = Arc<dyn Fn() -> Arc<dyn SelectionStrategy> + Send + Sync>;

/// Live adapters and credentials, keyed by provider
pub struct ProviderClientPool {
    clients: HashMap<ProviderKind, ProviderClient>,
    strategy: StrategyFactory,
}

impl Default for ProviderClientPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClientPool {
    /// Empty pool using random credential selection
    pub fn new() -> Self {
        Self::with_strategy(|| -> Arc<dyn SelectionStrategy> { Arc::new(RandomSelection) })
    }

    /// Empty pool using the given credential selection strategy
    ///
    /// `factory` runs once per registered provider, so stateful strategies
    /// keep a separate cursor for each provider.
    pub fn with_strategy<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn SelectionStrategy> + Send + Sync + 'static,
    {
        Self {
            clients: HashMap::new(),
            strategy: Arc::new(factory),
        }
    }

    /// Build HTTP adapters for every configured provider
    ///
    /// Providers that need a key but were given none are skipped with a
    /// warning, so their models fall through to mock responses.
    pub fn from_config(config: &ProvidersConfig, timeout: Duration) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))?;

        let mut pool = Self::new();
        for (kind, provider_config) in config.iter() {
            let credentials = provider_config.credentials();
            if kind.requires_credential() && credentials.is_empty() {
                tracing::warn!(provider = %kind, "provider configured without an API key, skipping");
                continue;
            }

            let adapter = provider::build_adapter(kind, provider_config.base_url.clone(), http.clone())?;
            tracing::debug!(provider = %kind, credentials = credentials.len(), "provider client ready");
            pool.insert(kind, adapter, credentials);
        }

        Ok(pool)
    }

    /// Register an adapter and its credentials, replacing any previous entry
    pub fn insert(&mut self, kind: ProviderKind, adapter: Arc<dyn ProviderAdapter>, credentials: Vec<SecretString>) {
        let client = ProviderClient {
            kind,
            adapter,
            credentials: Arc::new(CredentialPool::new(credentials, (self.strategy)())),
        };
        self.clients.insert(kind, client);
    }

    pub fn has_provider(&self, kind: ProviderKind) -> bool {
        self.clients.contains_key(&kind)
    }

    pub fn get_client(&self, kind: ProviderKind) -> Result<&ProviderClient, LlmError> {
        self.clients
            .get(&kind)
            .ok_or(LlmError::ProviderNotConfigured { provider: kind })
    }

    /// Select a credential for `kind`, `None` if unconfigured or keyless
    pub fn pick_credential(&self, kind: ProviderKind) -> Option<SecretString> {
        self.clients.get(&kind).and_then(ProviderClient::pick_credential)
    }

    /// Configured providers, in no particular order
    pub fn providers(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.clients.keys().copied()
    }
}
