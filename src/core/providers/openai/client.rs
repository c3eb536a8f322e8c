//! OpenAI-compatible HTTP client.
//!
//! Azure reuses this client's request/response shapes with a different URL
//! builder and header set; see `super::super::azure::client`.

use super::config::OpenAiConfig;
use super::error::map_status;
use super::streaming::SseParser;
use crate::core::catalog::{ModelConfig, ProviderConfig};
use crate::core::providers::LlmProvider;
use crate::core::types::chat::ValidatedRequest;
use crate::core::types::responses::{ChatChunk, ChatResponse};
use crate::errors::{EngineError, EngineResult};
use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;

pub struct OpenAiProvider {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(http: Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    fn request_body(&self, request: &ValidatedRequest, model: &ModelConfig, stream: bool) -> Value {
        let messages: Vec<Value> = request
            .request()
            .chat_input
            .as_context()
            .iter()
            .map(|m| {
                json!({
                    "role": m.role,
                    "content": m.content.to_value(),
                })
            })
            .collect();

        let mut body = json!({
            "model": model.model_id,
            "messages": messages,
            "stream": stream,
        });

        if let Value::Object(ref mut map) = body {
            for (key, value) in &request.request().parameters {
                map.insert(key.clone(), value.clone());
            }
        }

        body
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider_id(&self) -> &'static str {
        "openai"
    }

    async fn chat(
        &self,
        request: &ValidatedRequest,
        model: &ModelConfig,
        _provider: &ProviderConfig,
    ) -> EngineResult<ChatResponse> {
        let body = self.request_body(request, model, false);

        let response = self
            .http
            .post(self.config.chat_completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::upstream("openai", e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::upstream("openai", e.to_string()))?;

        if !status.is_success() {
            return Err(map_status("openai", status.as_u16(), &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| EngineError::protocol("openai", format!("malformed response: {e}")))
    }

    async fn chat_stream(
        &self,
        request: &ValidatedRequest,
        model: &ModelConfig,
        _provider: &ProviderConfig,
    ) -> EngineResult<BoxStream<'static, EngineResult<ChatChunk>>> {
        let body = self.request_body(request, model, true);

        let response = self
            .http
            .post(self.config.chat_completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::upstream("openai", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_status("openai", status.as_u16(), &text));
        }

        let mut byte_stream = response.bytes_stream();
        let mut parser = SseParser::new("openai");

        let chunk_stream = try_stream! {
            while let Some(next) = byte_stream.next().await {
                let bytes: Bytes = next.map_err(|e| EngineError::upstream("openai", e.to_string()))?;
                let text = match std::str::from_utf8(&bytes) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(provider = "openai", error = %e, "dropped non-UTF8 stream bytes");
                        continue;
                    }
                };
                for chunk in parser.push(text)? {
                    yield chunk;
                }
                if parser.is_finished() {
                    break;
                }
            }
        };

        Ok(chunk_stream.boxed())
    }
}
