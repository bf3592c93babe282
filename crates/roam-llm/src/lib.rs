//! LLM provider gateway for Roam
//!
//! Maps logical model names to concrete provider/model pairs, dispatches
//! requests through per-provider adapters, recovers from transient failures
//! with local retry and cross-model fallback, and drives a bounded
//! tool-calling loop on top.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod catalog;
pub mod chat;
pub mod convert;
pub mod cooldown;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod protocol;
pub mod provider;
pub mod retry;
pub mod tool_loop;
pub mod tools;
pub mod types;

#[cfg(test)]
mod testing;

pub use catalog::{ModelCatalog, ModelConfig, ModelSummary};
pub use chat::{ChatError, ChatReply, ChatRequest, ChatService, HistoryStore, InMemoryHistory, KnowledgeSearch, SearchHit};
pub use cooldown::CooldownTracker;
pub use credentials::{CredentialPool, ProviderClient, ProviderClientPool, RandomSelection, RoundRobinSelection, SelectionStrategy, StrategyFactory};
pub use dispatcher::Dispatcher;
pub use error::{FailureClass, LlmError, classify_failure};
pub use fallback::{FallbackOrchestrator, Generation, Outcome};
pub use gateway::{GenerateRequest, Gateway};
pub use provider::ProviderAdapter;
pub use roam_config::ProviderKind;
pub use tool_loop::{ToolCallLoop, ToolLoopOutcome};
pub use tools::{CallerIdentity, Tool, ToolError, ToolRegistry};
pub use types::{
    DispatchRequest, DispatchResult, GenerationOptions, Part, RawTurn, Role, ToolCallResult, ToolDeclaration,
    ToolInvocation, ToolResult, Turn,
};
