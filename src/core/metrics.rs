//! Token counting, cost calculation, and latency/throughput figures.

use crate::core::catalog::ModelConfig;
use crate::core::streaming::joiner::JoinedCompletion;
use crate::core::tokenizer::{ApproximateTokenizer, Tokenizer};
use crate::core::types::chat::ValidatedRequest;
use crate::core::types::envelope::Metrics;
use crate::core::types::responses::Usage;
use std::time::Instant;

/// Non-stream metrics: token counts come straight from the upstream `usage`
/// object.
pub fn compute_non_stream_metrics(
    model: &ModelConfig,
    usage: &Usage,
    dispatched_at: Instant,
) -> Metrics {
    let latency_s = dispatched_at.elapsed().as_secs_f64();
    let cost_usd = model.cost.cost_usd(usage);
    Metrics {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
        cost_usd,
        latency_s,
        time_to_first_token_s: None,
        inter_token_latency_s: None,
        tokens_per_second: if latency_s > 0.0 { usage.total_tokens as f64 / latency_s } else { 0.0 },
    }
}

/// Stream metrics: token counts are estimated by tokenizing the canonical
/// string form of the input and the joined output, since most providers
/// don't report `usage` on every chunk.
pub fn compute_stream_metrics(
    request: &ValidatedRequest,
    model: &ModelConfig,
    joined: &JoinedCompletion,
    dispatched_at: Instant,
    first_token_time: Option<Instant>,
    token_times_ms: &[f64],
) -> Metrics {
    let tokenizer = ApproximateTokenizer;
    let input_tokens = tokenizer.count(&request.request().chat_input.canonical_string());
    let output_tokens = tokenizer.count(&joined.canonical_output);
    let total_tokens = input_tokens + output_tokens;

    let usage = Usage { prompt_tokens: input_tokens, completion_tokens: output_tokens, total_tokens };
    let cost_usd = model.cost.cost_usd(&usage);

    let latency_s = dispatched_at.elapsed().as_secs_f64();
    let time_to_first_token_s = first_token_time.map(|t| t.duration_since(dispatched_at).as_secs_f64());
    let inter_token_latency_s = if token_times_ms.is_empty() {
        None
    } else {
        Some(token_times_ms.iter().sum::<f64>() / token_times_ms.len() as f64 / 1000.0)
    };
    let tokens_per_second = if latency_s > 0.0 { output_tokens as f64 / latency_s } else { 0.0 };

    Metrics {
        input_tokens,
        output_tokens,
        total_tokens,
        cost_usd,
        latency_s,
        time_to_first_token_s,
        inter_token_latency_s,
        tokens_per_second,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::TokenCost;

    fn model() -> ModelConfig {
        ModelConfig {
            model_id: "gpt-4o".into(),
            provider: "openai".into(),
            deployment: None,
            cost: TokenCost::Flat { input_per_million: 5.0, output_per_million: 15.0 },
            max_context_tokens: 128_000,
            supports_tools: true,
        }
    }

    #[test]
    fn non_stream_total_equals_input_plus_output() {
        let usage = Usage { prompt_tokens: 100, completion_tokens: 50, total_tokens: 150 };
        let m = compute_non_stream_metrics(&model(), &usage, Instant::now());
        assert_eq!(m.total_tokens, m.input_tokens + m.output_tokens);
    }

    #[test]
    fn stream_without_chunks_has_no_inter_token_latency() {
        let request = crate::core::types::chat::ChatRequest::new(
            "gpt-4o",
            crate::core::types::chat::ChatInput::Text("hi".into()),
        );
        let validated = crate::core::validator::validate(
            request,
            &crate::core::catalog::ModelCatalog::new(
                vec![model()],
                vec![crate::core::catalog::ProviderConfig {
                    provider_id: "openai".into(),
                    base_url: "https://api.openai.com/v1".into(),
                    api_key_env: "OPENAI_API_KEY".into(),
                }],
            ),
        )
        .unwrap();

        let joined = JoinedCompletion {
            message: crate::core::types::responses::ChatCompletionMessage {
                role: crate::core::types::MessageRole::Assistant,
                content: Some("hello".into()),
                tool_calls: None,
                function_call: None,
            },
            finish_reason: "stop".into(),
            canonical_output: "hello".into(),
        };

        let m = compute_stream_metrics(&validated, &model(), &joined, Instant::now(), None, &[]);
        assert!(m.inter_token_latency_s.is_none());
    }
}
