//! Structural validation of a loaded [`super::EngineConfig`].
//!
//! Runs once at startup, before the catalog is built. A failure here must
//! never surface mid-call.

use super::{EngineConfig, RawTokenCost};
use crate::errors::{EngineError, EngineResult};

pub fn validate(config: &EngineConfig) -> EngineResult<()> {
    if config.providers.is_empty() {
        return Err(EngineError::Configuration("no providers configured".into()));
    }

    for (provider_id, provider) in &config.providers {
        if provider_id.trim().is_empty() {
            return Err(EngineError::Configuration("provider id must not be empty".into()));
        }
        if provider.base_url.trim().is_empty() {
            return Err(EngineError::Configuration(format!("provider '{provider_id}' has an empty base_url")));
        }
    }

    for (model_id, model) in &config.models {
        if model_id.trim().is_empty() {
            return Err(EngineError::Configuration("model id must not be empty".into()));
        }
        if !config.providers.contains_key(&model.provider) {
            return Err(EngineError::Configuration(format!(
                "model '{model_id}' references unknown provider '{}'",
                model.provider
            )));
        }
        validate_cost(model_id, &model.cost)?;
    }

    Ok(())
}

fn validate_cost(model_id: &str, cost: &RawTokenCost) -> EngineResult<()> {
    let tiers = match cost {
        RawTokenCost::Flat { .. } => return Ok(()),
        RawTokenCost::Tiered { tiers } => tiers,
    };

    if tiers.is_empty() {
        return Err(EngineError::Configuration(format!("model '{model_id}' has an empty tier list")));
    }

    let mut previous_floor: Option<u64> = None;
    for tier in tiers {
        if let Some(prev) = previous_floor {
            if tier.floor_tokens <= prev {
                return Err(EngineError::Configuration(format!(
                    "model '{model_id}' has unsorted or overlapping cost tiers at floor {}",
                    tier.floor_tokens
                )));
            }
        }
        previous_floor = Some(tier.floor_tokens);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_from_str;

    fn base_yaml() -> String {
        r#"
providers:
  openai:
    base_url: "https://api.openai.com/v1"
    api_key: "${OPENAI_API_KEY}"
models:
  gpt-4o:
    provider: openai
    cost:
      input_per_million: 5.0
      output_per_million: 15.0
"#
        .to_string()
    }

    #[test]
    fn accepts_well_formed_config() {
        let config = load_from_str(&base_yaml()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_model_referencing_unknown_provider() {
        let yaml = r#"
providers:
  openai:
    base_url: "https://api.openai.com/v1"
    api_key: "${OPENAI_API_KEY}"
models:
  gpt-4o:
    provider: azure
    cost:
      input_per_million: 5.0
      output_per_million: 15.0
"#;
        let config = load_from_str(yaml).unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_overlapping_tiers() {
        let yaml = r#"
providers:
  openai:
    base_url: "https://api.openai.com/v1"
    api_key: "${OPENAI_API_KEY}"
models:
  gpt-4o:
    provider: openai
    cost:
      tiers:
        - floor_tokens: 0
          input_per_million: 5.0
          output_per_million: 15.0
        - floor_tokens: 0
          input_per_million: 2.5
          output_per_million: 10.0
"#;
        let config = load_from_str(yaml).unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn accepts_sorted_tiers() {
        let yaml = r#"
providers:
  openai:
    base_url: "https://api.openai.com/v1"
    api_key: "${OPENAI_API_KEY}"
models:
  gpt-4o:
    provider: openai
    cost:
      tiers:
        - floor_tokens: 0
          input_per_million: 5.0
          output_per_million: 15.0
        - floor_tokens: 128000
          input_per_million: 2.5
          output_per_million: 10.0
"#;
        let config = load_from_str(yaml).unwrap();
        assert!(validate(&config).is_ok());
    }
}
