use reqwest::StatusCode;
use roam_config::ProviderKind;
use thiserror::Error;

/// Errors that can occur inside the gateway
#[derive(Debug, Error)]
pub enum LlmError {
    /// Logical model name is absent from the catalog
    #[error("unknown model: {model}")]
    UnknownModel { model: String },

    /// No credential was supplied for the provider at startup
    #[error("provider not configured: {provider}")]
    ProviderNotConfigured { provider: ProviderKind },

    /// Rate limit, exhausted quota, overload or timeout
    #[error("transient provider failure: {0}")]
    Transient(String),

    /// Bad request, rejected credential, unknown upstream model
    #[error("{0}")]
    Permanent(String),

    /// Gateway assembled from inconsistent settings
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Whether this error may be recovered by retrying or switching models
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Build an error from an upstream failure, classifying it on the way
    pub fn upstream(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        let message = message.into();
        match classify_failure(status, &message) {
            FailureClass::Transient => Self::Transient(message),
            FailureClass::Permanent => Self::Permanent(message),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            return Self::Transient(e.to_string());
        }
        Self::upstream(e.status(), e.to_string())
    }
}

/// Outcome of classifying a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Worth retrying the same model or falling back to another one
    Transient,
    /// Would fail identically everywhere; surface immediately
    Permanent,
}

const TRANSIENT_STATUSES: &[u16] = &[408, 429, 500, 502, 503, 504, 529];

const TRANSIENT_MARKERS: &[&str] = &[
    "429",
    "503",
    "RESOURCE_EXHAUSTED",
    "QUOTA",
    "UNAVAILABLE",
    "RATE LIMIT",
    "RATE_LIMIT",
    "OVERLOADED",
    "TIMEOUT",
    "TIMED OUT",
];

/// Classify a provider failure from its HTTP status and error text
///
/// The status wins when it is one of the known transient codes; otherwise
/// the upper-cased text is scanned for known markers.
pub fn classify_failure(status: Option<StatusCode>, text: &str) -> FailureClass {
    if status.is_some_and(|s| TRANSIENT_STATUSES.contains(&s.as_u16())) {
        return FailureClass::Transient;
    }

    let upper = text.to_uppercase();
    if TRANSIENT_MARKERS.iter().any(|marker| upper.contains(marker)) {
        FailureClass::Transient
    } else {
        FailureClass::Permanent
    }
}
