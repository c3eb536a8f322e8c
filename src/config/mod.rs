//! Startup configuration: loads the provider/model catalog from YAML,
//! resolving `${ENV_VAR}` placeholders and validating tiered cost ranges
//! before any registry is built.

pub mod loader;
pub mod validation;

use crate::core::catalog::{CostTier, ModelCatalog, ModelConfig, ProviderConfig, TokenCost};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Raw, serde-facing shape of the YAML document. Kept separate from
/// [`crate::core::catalog::ModelCatalog`] so the wire format (tiers as a
/// flat list, `api_key` as a placeholder string) can diverge from the
/// runtime representation the engine actually dispatches against.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub defaults: Defaults,
    pub providers: HashMap<String, RawProviderConfig>,
    pub models: HashMap<String, RawModelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_timeout_s")]
    pub timeout_s: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self { retries: default_retries(), timeout_s: default_timeout_s() }
    }
}

fn default_retries() -> u32 {
    2
}

fn default_timeout_s() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProviderConfig {
    pub base_url: String,
    /// May contain a `${ENV_VAR}` placeholder, resolved by [`loader::resolve_env_placeholders`].
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawModelConfig {
    pub provider: String,
    #[serde(default)]
    pub deployment: Option<String>,
    #[serde(default)]
    pub max_context_tokens: u32,
    #[serde(default)]
    pub supports_tools: bool,
    pub cost: RawTokenCost,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTokenCost {
    Flat { input_per_million: f64, output_per_million: f64 },
    Tiered { tiers: Vec<RawCostTier> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCostTier {
    pub floor_tokens: u64,
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl EngineConfig {
    /// Validates the raw document, then builds the `Arc`-shared catalog the
    /// engine dispatches against. The provider's API key is resolved (but
    /// not otherwise used here — adapters pull it from the environment
    /// themselves via `api_key_env`) purely to catch missing env vars early.
    pub fn into_catalog(self) -> crate::errors::EngineResult<Arc<ModelCatalog>> {
        validation::validate(&self)?;

        let providers = self
            .providers
            .into_iter()
            .map(|(provider_id, raw)| ProviderConfig {
                provider_id,
                base_url: raw.base_url,
                api_key_env: loader::env_var_name(&raw.api_key),
            })
            .collect();

        let models = self
            .models
            .into_iter()
            .map(|(model_id, raw)| ModelConfig {
                model_id,
                provider: raw.provider,
                deployment: raw.deployment,
                cost: match raw.cost {
                    RawTokenCost::Flat { input_per_million, output_per_million } => {
                        TokenCost::Flat { input_per_million, output_per_million }
                    }
                    RawTokenCost::Tiered { tiers } => TokenCost::Tiered(
                        tiers
                            .into_iter()
                            .map(|t| CostTier {
                                floor_tokens: t.floor_tokens,
                                input_per_million: t.input_per_million,
                                output_per_million: t.output_per_million,
                            })
                            .collect(),
                    ),
                },
                max_context_tokens: raw.max_context_tokens,
                supports_tools: raw.supports_tools,
            })
            .collect();

        Ok(ModelCatalog::new(models, providers))
    }
}
