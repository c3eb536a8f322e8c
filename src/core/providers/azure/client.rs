//! Azure OpenAI HTTP client — reuses the OpenAI wire shape and SSE parser.

use super::config::AzureConfig;
use super::error::map_status;
use crate::core::catalog::{ModelConfig, ProviderConfig};
use crate::core::providers::openai::streaming::SseParser;
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

pub struct AzureProvider {
    http: Client,
    config: AzureConfig,
}

impl AzureProvider {
    pub fn new(http: Client, config: AzureConfig) -> Self {
        Self { http, config }
    }

    fn deployment<'a>(&self, model: &'a ModelConfig) -> EngineResult<&'a str> {
        model
            .deployment
            .as_deref()
            .ok_or_else(|| EngineError::Configuration(format!(
                "model '{}' has no Azure deployment configured",
                model.model_id
            )))
    }

    fn request_body(&self, request: &ValidatedRequest, stream: bool) -> Value {
        let messages: Vec<Value> = request
            .request()
            .chat_input
            .as_context()
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content.to_value() }))
            .collect();

        let mut body = json!({ "messages": messages, "stream": stream });
        if let Value::Object(ref mut map) = body {
            for (key, value) in &request.request().parameters {
                map.insert(key.clone(), value.clone());
            }
        }
        body
    }
}

#[async_trait]
impl LlmProvider for AzureProvider {
    fn provider_id(&self) -> &'static str {
        "azure"
    }

    async fn chat(
        &self,
        request: &ValidatedRequest,
        model: &ModelConfig,
        _provider: &ProviderConfig,
    ) -> EngineResult<ChatResponse> {
        let deployment = self.deployment(model)?;
        let body = self.request_body(request, false);

        let response = self
            .http
            .post(self.config.chat_completions_url(deployment))
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::upstream("azure", e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::upstream("azure", e.to_string()))?;

        if !status.is_success() {
            return Err(map_status(status.as_u16(), &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| EngineError::protocol("azure", format!("malformed response: {e}")))
    }

    async fn chat_stream(
        &self,
        request: &ValidatedRequest,
        model: &ModelConfig,
        _provider: &ProviderConfig,
    ) -> EngineResult<BoxStream<'static, EngineResult<ChatChunk>>> {
        let deployment = self.deployment(model)?;
        let body = self.request_body(request, true);

        let response = self
            .http
            .post(self.config.chat_completions_url(deployment))
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::upstream("azure", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), &text));
        }

        let mut byte_stream = response.bytes_stream();
        let mut parser = SseParser::new("azure");

        let chunk_stream = try_stream! {
            while let Some(next) = byte_stream.next().await {
                let bytes: Bytes = next.map_err(|e| EngineError::upstream("azure", e.to_string()))?;
                let text = match std::str::from_utf8(&bytes) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(provider = "azure", error = %e, "dropped non-UTF8 stream bytes");
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
