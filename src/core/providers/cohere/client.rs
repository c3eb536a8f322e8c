//! Cohere chat client. Cohere's request shape is `message` + `chat_history`
//! rather than an OpenAI-style `messages` array, so history and the final
//! user turn are split here before dispatch.

use super::config::CohereConfig;
use super::error::map_status;
use super::streaming::CohereEventParser;
use crate::core::catalog::{ModelConfig, ProviderConfig};
use crate::core::providers::LlmProvider;
use crate::core::types::chat::{ChatMessage, MessageRole, ValidatedRequest};
use crate::core::types::responses::{
    ChatChunk, ChatCompletionMessage, ChatResponse, Choice, Usage,
};
use crate::errors::{EngineError, EngineResult};
use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

pub struct CohereProvider {
    http: Client,
    config: CohereConfig,
}

impl CohereProvider {
    pub fn new(http: Client, config: CohereConfig) -> Self {
        Self { http, config }
    }

    fn split_history(messages: &[ChatMessage]) -> (Vec<Value>, String) {
        let mut history = Vec::new();
        let mut last_user = String::new();
        for (index, message) in messages.iter().enumerate() {
            let text = message.content.canonical_string();
            if index == messages.len() - 1 && matches!(message.role, MessageRole::User) {
                last_user = text;
                continue;
            }
            let role = match message.role {
                MessageRole::User => "USER",
                MessageRole::Assistant => "CHATBOT",
                MessageRole::System => "SYSTEM",
                MessageRole::Tool | MessageRole::Function => "TOOL",
            };
            history.push(json!({ "role": role, "message": text }));
        }
        (history, last_user)
    }

    fn request_body(&self, request: &ValidatedRequest, model: &ModelConfig, stream: bool) -> Value {
        let messages = request.request().chat_input.as_context();
        let (chat_history, message) = Self::split_history(&messages);

        let mut body = json!({
            "model": model.model_id,
            "message": message,
            "chat_history": chat_history,
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
impl LlmProvider for CohereProvider {
    fn provider_id(&self) -> &'static str {
        "cohere"
    }

    fn role_marker_only_first_chunk(&self) -> bool {
        false
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
            .post(self.config.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::upstream("cohere", e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::upstream("cohere", e.to_string()))?;

        if !status.is_success() {
            return Err(map_status(status.as_u16(), &text));
        }

        let raw: Value = serde_json::from_str(&text)
            .map_err(|e| EngineError::protocol("cohere", format!("malformed response: {e}")))?;

        let content = raw.get("text").and_then(Value::as_str).unwrap_or("").to_string();
        let billed = raw.pointer("/meta/billed_units");
        let input_tokens = billed.and_then(|b| b.get("input_tokens")).and_then(Value::as_f64).unwrap_or(0.0) as u32;
        let output_tokens = billed.and_then(|b| b.get("output_tokens")).and_then(Value::as_f64).unwrap_or(0.0) as u32;

        Ok(ChatResponse {
            id: raw.get("generation_id").and_then(Value::as_str).unwrap_or_default().to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model: model.model_id.clone(),
            choices: vec![Choice {
                index: 0,
                message: ChatCompletionMessage {
                    role: MessageRole::Assistant,
                    content: Some(content),
                    tool_calls: None,
                    function_call: None,
                },
                finish_reason: raw
                    .get("finish_reason")
                    .and_then(Value::as_str)
                    .map(|s| s.to_lowercase()),
            }],
            usage: Usage {
                prompt_tokens: input_tokens,
                completion_tokens: output_tokens,
                total_tokens: input_tokens + output_tokens,
            },
        })
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
            .post(self.config.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::upstream("cohere", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), &text));
        }

        let mut byte_stream = response.bytes_stream();
        let mut parser = CohereEventParser::new(Uuid::new_v4().to_string(), model.model_id.clone());

        let chunk_stream = try_stream! {
            while let Some(next) = byte_stream.next().await {
                let bytes: Bytes = next.map_err(|e| EngineError::upstream("cohere", e.to_string()))?;
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| EngineError::protocol("cohere", format!("invalid utf-8: {e}")))?;
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
