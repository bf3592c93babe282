//! Configuration for the Roam LLM gateway
//!
//! Loaded from a TOML file with `{{ env.VAR }}` expansion, or bootstrapped
//! directly from well-known environment variables.

#![allow(clippy::must_use_candidate)]

pub mod chat;
mod env;
pub mod llm;
mod loader;
pub mod telemetry;

use serde::Deserialize;

pub use chat::*;
pub use env::ExpandError;
pub use llm::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level Roam configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// LLM gateway configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Chat orchestration configuration
    #[serde(default)]
    pub chat: ChatConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
