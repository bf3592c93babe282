//! Placeholder answers for models whose provider is not configured

/// Marker every placeholder answer starts with
pub const MOCK_PREFIX: &str = "Mock response";

const PACKING_LIST_SAMPLE: &str = r#"[{"item": "Passport", "category": "Documents", "quantity": 1, "reason": "Required"}]"#;

const DEMO_NOTICE: &str = "I'm RoamIQ, currently in demo mode. Please configure API keys to unlock my full potential.";

/// Clearly labelled stand-in answer for `model_key`
///
/// Prompts asking for a packing list get a small JSON sample so callers that
/// parse structured output keep working in demo mode.
pub fn mock_response(model_key: &str, prompt: &str) -> String {
    let body = if prompt.to_lowercase().contains("packing list") {
        PACKING_LIST_SAMPLE
    } else {
        DEMO_NOTICE
    };
    format!("{MOCK_PREFIX} ({model_key} not configured): {body}")
}
