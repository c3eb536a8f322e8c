//! Request-side wire types: the provider-agnostic chat request shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Role of a message in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
    Function,
}

/// A single typed content part within a multi-part message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// A message's content: either a flat string or an ordered sequence of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Canonical string flattening used by the metrics engine's tokenizer input.
    ///
    /// For a flat string this is the string itself. For typed parts, every
    /// `text` value and every `image_url.url` value is concatenated in order.
    pub fn canonical_string(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        ContentPart::Text { text } => out.push_str(text),
                        ContentPart::ImageUrl { image_url } => out.push_str(&image_url.url),
                    }
                }
                out
            }
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A single message in a multi-turn conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }
}

/// `chat_input`: either a single user turn or an ordered message sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatInput {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl ChatInput {
    /// Wraps the input as the canonical message sequence used for `context`
    /// and for provider request construction. A string input becomes a
    /// single user message.
    pub fn as_context(&self) -> Vec<ChatMessage> {
        match self {
            ChatInput::Text(s) => vec![ChatMessage::user(s.clone())],
            ChatInput::Messages(msgs) => msgs.clone(),
        }
    }

    /// The envelope's `chat_input` field: the original string, or the
    /// `content` of the last message.
    pub fn echo_value(&self) -> Value {
        match self {
            ChatInput::Text(s) => Value::String(s.clone()),
            ChatInput::Messages(msgs) => msgs
                .last()
                .map(|m| m.content.to_value())
                .unwrap_or(Value::Null),
        }
    }

    /// Canonical string form used to tokenize input for streaming metrics.
    /// Idempotent: flattening an already-flat string returns it unchanged.
    pub fn canonical_string(&self) -> String {
        match self {
            ChatInput::Text(s) => s.clone(),
            ChatInput::Messages(msgs) => {
                let mut out = String::new();
                for m in msgs {
                    out.push_str(&m.content.canonical_string());
                }
                out
            }
        }
    }
}

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub chat_input: ChatInput,
    #[serde(default)]
    pub is_stream: bool,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, chat_input: ChatInput) -> Self {
        Self {
            model: model.into(),
            chat_input,
            is_stream: false,
            retries: 0,
            parameters: HashMap::new(),
        }
    }
}

/// A request that has passed structural and model-catalog validation.
///
/// Produced only by [`crate::core::validator::validate`]; the engine never
/// constructs one directly. Immutable for the lifetime of the call.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub(crate) request: ChatRequest,
}

impl ValidatedRequest {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }
}
