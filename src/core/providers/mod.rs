//! Provider adapters and the registry that dispatches to them.
//!
//! Each adapter turns a [`ValidatedRequest`] into an upstream HTTP call and
//! normalizes whatever comes back into the shared [`ChatResponse`]/[`ChatChunk`]
//! shapes, so the Stream Normalizer and Chunk Joiner never branch on provider.

pub mod azure;
pub mod cohere;
pub mod openai;

use crate::core::catalog::{ModelConfig, ProviderConfig};
use crate::core::types::chat::ValidatedRequest;
use crate::core::types::responses::{ChatChunk, ChatResponse};
use crate::errors::EngineResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::Arc;

/// A single upstream provider's wire protocol.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier used in catalog lookups and logging, e.g. `"openai"`.
    fn provider_id(&self) -> &'static str;

    /// True when this provider's first stream chunk carries only a role
    /// marker (no content), so the Chunk Joiner must skip it when
    /// concatenating `stop`/`length` text. OpenAI and Azure do this; Cohere
    /// does not.
    fn role_marker_only_first_chunk(&self) -> bool {
        true
    }

    async fn chat(
        &self,
        request: &ValidatedRequest,
        model: &ModelConfig,
        provider: &ProviderConfig,
    ) -> EngineResult<ChatResponse>;

    async fn chat_stream(
        &self,
        request: &ValidatedRequest,
        model: &ModelConfig,
        provider: &ProviderConfig,
    ) -> EngineResult<BoxStream<'static, EngineResult<ChatChunk>>>;
}

/// Read-only map of provider id to its adapter, built once at startup.
#[derive(Clone)]
pub struct ProviderRegistry {
    adapters: HashMap<&'static str, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new(adapters: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self {
            adapters: adapters.into_iter().map(|a| (a.provider_id(), a)).collect(),
        }
    }

    pub fn get(&self, provider_id: &str) -> EngineResult<Arc<dyn LlmProvider>> {
        self.adapters
            .get(provider_id)
            .cloned()
            .ok_or_else(|| crate::errors::EngineError::UnknownProvider(provider_id.to_string()))
    }
}
