use std::collections::HashSet;
use std::path::Path;

use secrecy::SecretString;

use crate::{Config, ProviderConfig, ProviderKind};

/// Environment variables consulted by [`Config::from_env`], per provider
const CREDENTIAL_VARS: &[(ProviderKind, &str)] = &[
    (ProviderKind::Google, "GOOGLE_API_KEY"),
    (ProviderKind::Openai, "OPENAI_API_KEY"),
    (ProviderKind::Anthropic, "ANTHROPIC_API_KEY"),
    (ProviderKind::Cohere, "COHERE_API_KEY"),
    (ProviderKind::Huggingface, "HUGGINGFACE_API_KEY"),
];

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// expanded, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text, expanding placeholders first
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Build configuration from well-known environment variables
    ///
    /// Each `*_API_KEY` variable that is set and non-blank enables its
    /// provider; `OLLAMA_BASE_URL` enables a local Ollama server and
    /// `AI_MODEL` overrides the default model.
    ///
    /// # Errors
    ///
    /// Returns an error if `OLLAMA_BASE_URL` is not a valid URL
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        for (kind, var) in CREDENTIAL_VARS {
            let Some(value) = non_blank_var(var) else {
                continue;
            };
            if let Some(slot) = config.llm.providers.slot_mut(*kind) {
                *slot = Some(ProviderConfig {
                    api_key: Some(SecretString::from(value)),
                    base_url: None,
                });
            }
        }

        if let Some(url) = non_blank_var("OLLAMA_BASE_URL") {
            let base_url = url
                .parse()
                .map_err(|e| anyhow::anyhow!("OLLAMA_BASE_URL is not a valid URL: {e}"))?;
            config.llm.providers.ollama = Some(ProviderConfig {
                api_key: None,
                base_url: Some(base_url),
            });
        }

        if let Some(model) = non_blank_var("AI_MODEL") {
            config.llm.default_model = model;
        }

        config.validate()?;

        tracing::debug!(
            providers = config.llm.providers.iter().count(),
            default_model = %config.llm.default_model,
            "configuration built from environment"
        );

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// Catalog membership of model names is checked later, when the gateway
    /// assembles its catalog.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_llm_bounds()?;
        self.validate_model_entries()?;
        self.validate_fallback()?;
        Ok(())
    }

    fn validate_llm_bounds(&self) -> anyhow::Result<()> {
        let llm = &self.llm;

        if llm.default_model.trim().is_empty() {
            anyhow::bail!("llm.default_model must not be empty");
        }

        if llm.retry.max_attempts == 0 {
            anyhow::bail!("llm.retry.max_attempts must be at least 1");
        }

        if llm.tool_loop.max_iterations == 0 {
            anyhow::bail!("llm.tool_loop.max_iterations must be at least 1");
        }

        if llm.request_timeout.is_zero() {
            anyhow::bail!("llm.request_timeout must be greater than zero");
        }

        Ok(())
    }

    fn validate_model_entries(&self) -> anyhow::Result<()> {
        for (name, entry) in &self.llm.models {
            if entry.max_tokens == 0 {
                anyhow::bail!("llm.models.{name}.max_tokens must be greater than 0");
            }

            if !(0.0..=2.0).contains(&entry.temperature) {
                anyhow::bail!("llm.models.{name}.temperature must be within [0, 2]");
            }

            if entry.cost_per_1k_tokens < 0.0 {
                anyhow::bail!("llm.models.{name}.cost_per_1k_tokens must not be negative");
            }
        }

        Ok(())
    }

    fn validate_fallback(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for kind in &self.llm.fallback.provider_priority {
            if *kind == ProviderKind::Mock {
                anyhow::bail!("llm.fallback.provider_priority must not contain the mock provider");
            }
            if !seen.insert(kind) {
                anyhow::bail!("llm.fallback.provider_priority lists '{kind}' more than once");
            }
        }

        Ok(())
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::LogFormat;

    const ALL_VARS: [&str; 7] = [
        "GOOGLE_API_KEY",
        "OPENAI_API_KEY",
        "ANTHROPIC_API_KEY",
        "COHERE_API_KEY",
        "HUGGINGFACE_API_KEY",
        "OLLAMA_BASE_URL",
        "AI_MODEL",
    ];

    fn unset_all() -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS.iter().map(|v| (*v, None)).collect()
    }

    #[test]
    fn parses_full_document() {
        let config = Config::from_toml_str(
            r#"
            [llm]
            default_model = "gemini-2.0-flash"
            request_timeout = "30s"

            [llm.providers.google]
            api_key = "k1,k2"

            [llm.providers.ollama]
            base_url = "http://localhost:11434"

            [llm.models."gpt-4o-mini"]
            provider = "openai"
            model = "gpt-4o-mini"
            max_tokens = 4000
            cost_per_1k_tokens = 0.00015

            [llm.fallback]
            symmetric = false
            cooldown = "90s"

            [llm.retry]
            max_attempts = 2
            base_delay = "500ms"

            [chat]
            history_limit = 6

            [telemetry]
            filter = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.default_model, "gemini-2.0-flash");
        assert_eq!(config.llm.request_timeout, Duration::from_secs(30));
        assert_eq!(config.llm.providers.google.as_ref().unwrap().credentials().len(), 2);
        assert!(config.llm.providers.ollama.is_some());
        assert_eq!(config.llm.models["gpt-4o-mini"].provider, ProviderKind::Openai);
        assert!((config.llm.models["gpt-4o-mini"].temperature - 0.7).abs() < f64::EPSILON);
        assert!(!config.llm.fallback.symmetric);
        assert_eq!(config.llm.fallback.cooldown, Duration::from_secs(90));
        assert_eq!(config.llm.retry.base_delay, Duration::from_millis(500));
        assert_eq!(config.chat.history_limit, 6);
        assert_eq!(config.telemetry.unwrap().format, LogFormat::Json);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_toml_str("[llm]\ndefault_modle = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn unknown_provider_section_is_rejected() {
        assert!(Config::from_toml_str("[llm.providers.mistral]\napi_key = \"x\"\n").is_err());
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let err = Config::from_toml_str(
            "[llm.models.hot]\nprovider = \"openai\"\nmodel = \"gpt\"\ntemperature = 2.5\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn zero_iterations_are_rejected() {
        let err = Config::from_toml_str("[llm.tool_loop]\nmax_iterations = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_iterations"));
    }

    #[test]
    fn duplicate_priority_entries_are_rejected() {
        let err =
            Config::from_toml_str("[llm.fallback]\nprovider_priority = [\"openai\", \"openai\"]\n").unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn placeholders_are_expanded_before_parsing() {
        temp_env::with_var("ROAM_TEST_OPENAI", Some("sk-test"), || {
            let config =
                Config::from_toml_str("[llm.providers.openai]\napi_key = \"{{ env.ROAM_TEST_OPENAI }}\"\n").unwrap();
            let keys = config.llm.providers.openai.unwrap().credentials();
            assert_eq!(keys[0].expose_secret(), "sk-test");
        });
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm]\ndefault_model = \"claude-3-sonnet\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.llm.default_model, "claude-3-sonnet");
    }

    #[test]
    fn missing_file_mentions_path() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn env_bootstrap_enables_keyed_providers() {
        let mut vars = unset_all();
        vars.retain(|(name, _)| *name != "GOOGLE_API_KEY" && *name != "AI_MODEL");
        vars.push(("GOOGLE_API_KEY", Some("g1, g2")));
        vars.push(("AI_MODEL", Some("gemini-2.0-flash")));

        temp_env::with_vars(vars, || {
            let config = Config::from_env().unwrap();
            let kinds: Vec<ProviderKind> = config.llm.providers.iter().map(|(kind, _)| kind).collect();
            assert_eq!(kinds, vec![ProviderKind::Google]);
            assert_eq!(config.llm.providers.google.unwrap().credentials().len(), 2);
            assert_eq!(config.llm.default_model, "gemini-2.0-flash");
        });
    }

    #[test]
    fn env_bootstrap_ignores_blank_keys() {
        let mut vars = unset_all();
        vars.retain(|(name, _)| *name != "OPENAI_API_KEY");
        vars.push(("OPENAI_API_KEY", Some("   ")));

        temp_env::with_vars(vars, || {
            let config = Config::from_env().unwrap();
            assert!(config.llm.providers.openai.is_none());
        });
    }

    #[test]
    fn env_bootstrap_rejects_bad_ollama_url() {
        let mut vars = unset_all();
        vars.retain(|(name, _)| *name != "OLLAMA_BASE_URL");
        vars.push(("OLLAMA_BASE_URL", Some("not a url")));

        temp_env::with_vars(vars, || {
            assert!(Config::from_env().is_err());
        });
    }
}
