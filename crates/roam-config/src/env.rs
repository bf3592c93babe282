use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Failure to expand a `{{ ... }}` placeholder
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpandError {
    /// Referenced variable is unset and no default was given
    #[error("environment variable not found: `{0}`")]
    MissingVar(String),
    /// Placeholder is not scoped with `env.`
    #[error("only variables scoped with 'env.' are supported: `{0}`")]
    UnsupportedScope(String),
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Group 1 is the scoped key, group 2 the optional default("...") value
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
    })
}

/// Expand `{{ env.VAR }}` and `{{ env.VAR | default("x") }}` in raw TOML
///
/// Comment lines are copied through untouched so that documented-but-unused
/// variables do not have to be set.
pub fn expand_env(input: &str) -> Result<String, ExpandError> {
    let lines = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                Ok(line.to_owned())
            } else {
                expand_line(line)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut output = lines.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

fn expand_line(line: &str) -> Result<String, ExpandError> {
    let mut failure = None;

    let expanded = placeholder().replace_all(line, |caps: &Captures<'_>| {
        match resolve(&caps[1], caps.get(2).map(|m| m.as_str())) {
            Ok(value) => value,
            Err(e) => {
                failure.get_or_insert(e);
                String::new()
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(expanded.into_owned()),
    }
}

fn resolve(key: &str, default: Option<&str>) -> Result<String, ExpandError> {
    let Some(var_name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(ExpandError::UnsupportedScope(key.to_owned()));
    };

    match std::env::var(var_name) {
        Ok(value) => Ok(value),
        Err(_) => default
            .map(str::to_owned)
            .ok_or_else(|| ExpandError::MissingVar(var_name.to_owned())),
    }
}
