use serde::Deserialize;

/// Chat orchestration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Number of prior messages replayed into each chat turn
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Persona prefix for the system prompt
    #[serde(default = "default_persona")]
    pub persona: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            persona: default_persona(),
        }
    }
}

const fn default_history_limit() -> usize {
    10
}

fn default_persona() -> String {
    "You are RoamIQ, a premium AI travel assistant.".to_owned()
}
