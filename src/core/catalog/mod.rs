//! Model catalog: which provider serves which model, and at what price.
//!
//! A single static catalog, built at startup from [`crate::config::EngineConfig`],
//! shared read-only across every call via an [`Arc`].

use crate::core::types::responses::Usage;
use crate::errors::{EngineError, EngineResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-token-million pricing, optionally split into volume tiers.
#[derive(Debug, Clone)]
pub enum TokenCost {
    /// A flat per-million-token rate for input and output tokens.
    Flat { input_per_million: f64, output_per_million: f64 },
    /// Tiered by cumulative prompt-token volume within the call; the last
    /// tier with `floor_tokens <= prompt_tokens` applies to the whole call.
    Tiered(Vec<CostTier>),
}

#[derive(Debug, Clone)]
pub struct CostTier {
    pub floor_tokens: u64,
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl TokenCost {
    fn rates_for(&self, prompt_tokens: u32) -> (f64, f64) {
        match self {
            TokenCost::Flat { input_per_million, output_per_million } => {
                (*input_per_million, *output_per_million)
            }
            TokenCost::Tiered(tiers) => {
                let mut chosen = tiers.first();
                for tier in tiers {
                    if tier.floor_tokens <= prompt_tokens as u64 {
                        chosen = Some(tier);
                    }
                }
                match chosen {
                    Some(t) => (t.input_per_million, t.output_per_million),
                    None => (0.0, 0.0),
                }
            }
        }
    }

    pub fn cost_usd(&self, usage: &Usage) -> f64 {
        let (input_rate, output_rate) = self.rates_for(usage.prompt_tokens);
        (usage.prompt_tokens as f64 / 1_000_000.0) * input_rate
            + (usage.completion_tokens as f64 / 1_000_000.0) * output_rate
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_id: String,
    pub provider: String,
    pub deployment: Option<String>,
    pub cost: TokenCost,
    pub max_context_tokens: u32,
    pub supports_tools: bool,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub base_url: String,
    pub api_key_env: String,
}

/// Read-only registry of known models and their owning providers.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, ModelConfig>,
    providers: HashMap<String, ProviderConfig>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelConfig>, providers: Vec<ProviderConfig>) -> Arc<Self> {
        Arc::new(Self {
            models: models.into_iter().map(|m| (m.model_id.clone(), m)).collect(),
            providers: providers.into_iter().map(|p| (p.provider_id.clone(), p)).collect(),
        })
    }

    pub fn lookup_model(&self, model_id: &str) -> EngineResult<&ModelConfig> {
        self.models
            .get(model_id)
            .ok_or_else(|| EngineError::unsupported_model("unknown", model_id))
    }

    pub fn lookup_provider(&self, provider_id: &str) -> EngineResult<&ProviderConfig> {
        self.providers
            .get(provider_id)
            .ok_or_else(|| EngineError::UnknownProvider(provider_id.to_string()))
    }

    /// Resolves a model id to its owning provider config in one step, as the
    /// validator and engine need both together.
    pub fn resolve(&self, model_id: &str) -> EngineResult<(&ModelConfig, &ProviderConfig)> {
        let model = self
            .models
            .get(model_id)
            .ok_or_else(|| EngineError::unsupported_model("unknown", model_id))?;
        let provider = self
            .providers
            .get(&model.provider)
            .ok_or_else(|| EngineError::UnknownProvider(model.provider.clone()))?;
        Ok((model, provider))
    }
}
