//! Normalizes an upstream chunk stream into the canonical envelope sequence.

pub mod joiner;

use crate::core::catalog::ModelConfig;
use crate::core::metrics;
use crate::core::providers::LlmProvider;
use crate::core::types::chat::ValidatedRequest;
use crate::core::types::envelope::{resolve_model_fields, Envelope};
use crate::core::types::responses::{ChatChunk, Choice};
use crate::errors::{EngineError, EngineResult};
use async_stream::try_stream;
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use std::time::Instant;

/// Drives an upstream chunk stream to completion, emitting one envelope per
/// content-bearing chunk and a final envelope carrying `metrics`.
#[allow(clippy::too_many_arguments)]
pub fn normalize(
    call_id: String,
    upstream: BoxStream<'static, EngineResult<ChatChunk>>,
    request: ValidatedRequest,
    model: ModelConfig,
    provider: std::sync::Arc<dyn LlmProvider>,
    provider_id: String,
    deployment: Option<String>,
    dispatched_at: Instant,
) -> BoxStream<'static, EngineResult<Envelope>> {
    let stream = try_stream! {
        let mut upstream = upstream;
        let mut accumulated: Vec<ChatChunk> = Vec::new();
        let mut first_token_time: Option<Instant> = None;
        let mut previous_token_time: Option<Instant> = None;
        let mut token_times_ms: Vec<f64> = Vec::new();
        let mut upstream_model = String::new();
        let chat_input_echo = request.request().chat_input.echo_value();
        let parameters = request.request().parameters.clone();
        let context = request.request().chat_input.as_context();

        while let Some(next) = upstream.next().await {
            let chunk = next?;
            let now = Instant::now();

            if !chunk.model.is_empty() && upstream_model.is_empty() {
                upstream_model = chunk.model.clone();
            }

            if first_token_time.is_none() {
                first_token_time = Some(now);
            } else if let Some(prev) = previous_token_time {
                token_times_ms.push(now.duration_since(prev).as_secs_f64() * 1000.0);
            }
            previous_token_time = Some(now);

            let is_terminal = chunk
                .choices
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .is_some();

            if !is_terminal {
                let (resolved_model, resolved_deployment) =
                    resolve_model_fields(&request.request().model, &upstream_model);
                if let Some(choice) = chunk.choices.first() {
                    yield Envelope {
                        id: call_id.clone(),
                        chat_input: chat_input_echo.clone(),
                        chat_output: choice
                            .delta
                            .content
                            .clone()
                            .map(Value::String)
                            .unwrap_or(Value::Null),
                        context: context.clone(),
                        provider: provider_id.clone(),
                        model: resolved_model,
                        deployment: resolved_deployment.or_else(|| deployment.clone()),
                        timestamp: now_unix(),
                        parameters: parameters.clone(),
                        metrics: None,
                        choices: Vec::new(),
                    };
                }
            }

            accumulated.push(chunk);
        }

        if accumulated.is_empty() {
            Err(EngineError::protocol(provider_id.clone(), "stream ended before any chunk arrived"))?;
        }

        let joined = joiner::join(
            &accumulated,
            &provider_id,
            provider.role_marker_only_first_chunk(),
        )?;

        let call_metrics = metrics::compute_stream_metrics(
            &request,
            &model,
            &joined,
            dispatched_at,
            first_token_time,
            &token_times_ms,
        );

        let (resolved_model, resolved_deployment) =
            resolve_model_fields(&request.request().model, &upstream_model);

        yield Envelope {
            id: call_id,
            chat_input: chat_input_echo,
            chat_output: Value::Null,
            context,
            provider: provider_id,
            model: resolved_model,
            deployment: resolved_deployment.or(deployment),
            timestamp: now_unix(),
            parameters,
            metrics: Some(call_metrics),
            choices: vec![Choice {
                index: 0,
                message: joined.message,
                finish_reason: Some(joined.finish_reason),
            }],
        };
    };

    stream.boxed()
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
