//! The canonical envelope: the single shape every provider adapter's
//! output is normalized into, for both one-shot and streamed calls.

use super::chat::ChatMessage;
use super::responses::Choice;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Per-call performance and cost figures, computed by the Metrics Engine.
/// Present only on the single envelope that terminates a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    pub cost_usd: f64,
    pub latency_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_first_token_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter_token_latency_s: Option<f64>,
    pub tokens_per_second: f64,
}

/// The canonical, provider-agnostic result of a chat call: a superset of an
/// upstream `chat.completion`/`chat.completion.chunk` object.
///
/// For a non-stream call this is emitted once, with `choices` carrying the
/// full assistant message. For a stream call one envelope is emitted per
/// upstream chunk (`chat_output` carrying that chunk's incremental delta
/// text, `choices` empty), and a terminator envelope carries `metrics` and
/// the full `choices`, with `chat_output = null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    /// Original input if it was a string, else the `content` of the last message.
    pub chat_input: Value,
    /// Incremental delta text for per-chunk envelopes; `null` for non-stream
    /// and stream-terminator envelopes (the assistant content lives in `choices`).
    pub chat_output: Value,
    /// Original message sequence; string inputs are wrapped as a single user turn.
    pub context: Vec<ChatMessage>,
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    pub timestamp: i64,
    pub parameters: HashMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

/// Resolves the envelope's `model`/`deployment` fields from the
/// caller-requested model and whatever model name the upstream reported.
pub fn resolve_model_fields(requested: &str, upstream_reported: &str) -> (String, Option<String>) {
    if upstream_reported.is_empty() || upstream_reported == requested {
        return (requested.to_string(), None);
    }
    if upstream_reported.starts_with(requested) {
        (upstream_reported.to_string(), Some(upstream_reported.to_string()))
    } else {
        (requested.to_string(), Some(requested.to_string()))
    }
}
