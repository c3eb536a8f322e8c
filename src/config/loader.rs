//! YAML loading and `${ENV_VAR}` placeholder resolution.

use super::EngineConfig;
use crate::errors::{EngineError, EngineResult};
use std::path::Path;
use tracing::debug;

/// Reads and parses a YAML document from disk. Placeholder substitution
/// happens lazily per-field via [`env_var_name`]/[`resolve`], not here, so
/// a config can be loaded in a process that doesn't yet have the provider's
/// key exported (e.g. during `cargo test`).
pub fn load_from_path(path: impl AsRef<Path>) -> EngineResult<EngineConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Configuration(format!("failed to read {}: {e}", path.display())))?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> EngineResult<EngineConfig> {
    let config: EngineConfig = serde_yaml::from_str(content)
        .map_err(|e| EngineError::Configuration(format!("failed to parse config: {e}")))?;
    debug!(providers = config.providers.len(), models = config.models.len(), "loaded engine config");
    Ok(config)
}

/// Extracts the variable name out of a `${VAR_NAME}` placeholder. A bare
/// value with no placeholder syntax is treated as a literal env var name,
/// so `api_key: OPENAI_API_KEY` and `api_key: ${OPENAI_API_KEY}` behave
/// identically.
pub fn env_var_name(raw: &str) -> String {
    match raw.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        Some(inner) => inner.to_string(),
        None => raw.to_string(),
    }
}

/// Resolves a `${ENV_VAR}` placeholder to its current value, failing loudly
/// if the variable isn't set. Used at startup to catch a missing key before
/// the registry is built, rather than on the first dispatched call.
pub fn resolve(raw: &str) -> EngineResult<String> {
    let var_name = env_var_name(raw);
    std::env::var(&var_name)
        .map_err(|_| EngineError::Configuration(format!("environment variable '{var_name}' is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_placeholder_var_name() {
        assert_eq!(env_var_name("${OPENAI_API_KEY}"), "OPENAI_API_KEY");
        assert_eq!(env_var_name("OPENAI_API_KEY"), "OPENAI_API_KEY");
    }

    #[test]
    fn resolve_fails_when_var_unset() {
        assert!(resolve("${DEFINITELY_NOT_SET_XYZ}").is_err());
    }

    #[test]
    fn parses_minimal_document() {
        let yaml = r#"
providers:
  openai:
    base_url: "https://api.openai.com/v1"
    api_key: "${OPENAI_API_KEY}"
models:
  gpt-4o:
    provider: openai
    max_context_tokens: 128000
    supports_tools: true
    cost:
      input_per_million: 5.0
      output_per_million: 15.0
"#;
        let config = load_from_str(yaml).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.models.len(), 1);
    }
}
