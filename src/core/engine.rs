//! Top-level `chat`/`achat` entry points: validates, dispatches with retry,
//! and normalizes into the canonical envelope (or envelope stream).

use crate::core::catalog::ModelCatalog;
use crate::core::metrics;
use crate::core::providers::ProviderRegistry;
use crate::core::retry::with_retry;
use crate::core::streaming;
use crate::core::types::chat::ChatRequest;
use crate::core::types::envelope::{resolve_model_fields, Envelope};
use crate::core::validator::validate;
use crate::errors::{EngineError, EngineResult};
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// Shared, read-only state needed to dispatch any call. Cheap to clone
/// (everything inside is `Arc`-backed), matching the teacher's pattern of
/// passing a small shared handle rather than the whole registry by value.
#[derive(Clone)]
pub struct Engine {
    catalog: Arc<ModelCatalog>,
    providers: Arc<ProviderRegistry>,
}

impl Engine {
    pub fn new(catalog: Arc<ModelCatalog>, providers: Arc<ProviderRegistry>) -> Self {
        Self { catalog, providers }
    }

    /// Cooperative-suspending entry point. Returns a single envelope for a
    /// non-stream request, or drives the caller through `achat_stream` for a
    /// streaming one.
    pub async fn achat(&self, request: ChatRequest) -> EngineResult<EnvelopeOrStream> {
        let is_stream = request.is_stream;
        let retries = request.retries;
        let call_id = Uuid::new_v4().to_string();
        let validated = validate(request, &self.catalog)?;
        let (model, provider_cfg) = self.catalog.resolve(&validated.request().model)?;
        let model = model.clone();
        let provider_cfg = provider_cfg.clone();
        let adapter = self.providers.get(&model.provider)?;

        let span = info_span!("chat_call", provider = %model.provider, model = %model.model_id, request_id = %call_id);

        async move {
            let dispatched_at = Instant::now();

            if !is_stream {
                let response = with_retry(
                    retries,
                    |attempt| {
                        let adapter = adapter.clone();
                        let validated = &validated;
                        let model = &model;
                        let provider_cfg = &provider_cfg;
                        async move {
                            if attempt > 0 {
                                debug!(attempt, "retrying dispatch after rate limit");
                            }
                            adapter.chat(validated, model, provider_cfg).await
                        }
                    },
                    EngineError::is_retryable,
                )
                .await
                .map_err(|e| {
                    if matches!(e, EngineError::RateLimited { .. }) {
                        warn!(provider = %model.provider, "exhausted retry budget on rate limit");
                    }
                    e
                })?;

                let call_metrics = metrics::compute_non_stream_metrics(&model, &response.usage, dispatched_at);
                let (resolved_model, deployment) = resolve_model_fields(&model.model_id, &response.model);

                let envelope = Envelope {
                    id: call_id,
                    chat_input: validated.request().chat_input.echo_value(),
                    chat_output: serde_json::Value::Null,
                    context: validated.request().chat_input.as_context(),
                    provider: model.provider.clone(),
                    model: resolved_model,
                    deployment: deployment.or_else(|| model.deployment.clone()),
                    timestamp: unix_now(),
                    parameters: validated.request().parameters.clone(),
                    metrics: Some(call_metrics),
                    choices: response.choices,
                };

                Ok(EnvelopeOrStream::Single(Box::new(envelope)))
            } else {
                let stream = adapter.chat_stream(&validated, &model, &provider_cfg).await?;
                let normalized = streaming::normalize(
                    call_id,
                    stream,
                    validated,
                    model.clone(),
                    adapter,
                    model.provider.clone(),
                    model.deployment.clone(),
                    dispatched_at,
                );
                Ok(EnvelopeOrStream::Stream(normalized))
            }
        }
        .instrument(span)
        .await
    }

    /// Blocking entry point: drives [`Self::achat`] to completion on a
    /// dedicated single-threaded runtime, the same pattern the teacher uses
    /// in its synchronous test harnesses.
    pub fn chat(&self, request: ChatRequest) -> EngineResult<EnvelopeOrBlockingIter> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| EngineError::Configuration(format!("failed to start runtime: {e}")))?;

        match runtime.block_on(self.achat(request))? {
            EnvelopeOrStream::Single(envelope) => Ok(EnvelopeOrBlockingIter::Single(envelope)),
            EnvelopeOrStream::Stream(stream) => {
                Ok(EnvelopeOrBlockingIter::Stream(BlockingEnvelopeIter { runtime, stream }))
            }
        }
    }
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub enum EnvelopeOrStream {
    Single(Box<Envelope>),
    Stream(BoxStream<'static, EngineResult<Envelope>>),
}

impl std::fmt::Debug for EnvelopeOrStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeOrStream::Single(envelope) => {
                f.debug_tuple("Single").field(envelope).finish()
            }
            EnvelopeOrStream::Stream(_) => f.debug_tuple("Stream").field(&"<stream>").finish(),
        }
    }
}

pub enum EnvelopeOrBlockingIter {
    Single(Box<Envelope>),
    Stream(BlockingEnvelopeIter),
}

/// Drives an async envelope stream from blocking code by pumping a
/// dedicated runtime one `next()` at a time.
pub struct BlockingEnvelopeIter {
    runtime: tokio::runtime::Runtime,
    stream: BoxStream<'static, EngineResult<Envelope>>,
}

impl Iterator for BlockingEnvelopeIter {
    type Item = EngineResult<Envelope>;

    fn next(&mut self) -> Option<Self::Item> {
        use futures::StreamExt;
        self.runtime.block_on(self.stream.next())
    }
}
