//! Structural and model-catalog validation of an inbound request.

use crate::core::catalog::ModelCatalog;
use crate::core::types::chat::{ChatInput, ChatRequest, ValidatedRequest};
use crate::errors::{EngineError, EngineResult};

const MAX_CONTENT_CHARS: usize = 100_000;

/// Validates a request's shape and resolves its model against the catalog.
///
/// Returns a [`ValidatedRequest`], the only way one can be constructed.
pub fn validate(request: ChatRequest, catalog: &ModelCatalog) -> EngineResult<ValidatedRequest> {
    if request.model.trim().is_empty() {
        return Err(EngineError::validation("model must not be empty"));
    }

    validate_chat_input(&request.chat_input)?;
    catalog.lookup_model(&request.model)?;

    Ok(ValidatedRequest { request })
}

fn validate_chat_input(input: &ChatInput) -> EngineResult<()> {
    match input {
        ChatInput::Text(text) => validate_text(text, 0),
        ChatInput::Messages(messages) => {
            if messages.is_empty() {
                return Err(EngineError::validation("chat_input messages must not be empty"));
            }

            let mut has_user_message = false;
            for (index, message) in messages.iter().enumerate() {
                let text = message.content.canonical_string();
                validate_text(&text, index)?;
                if matches!(message.role, crate::core::types::chat::MessageRole::User) {
                    has_user_message = true;
                }
            }

            if !has_user_message {
                return Err(EngineError::validation("at least one user message is required"));
            }
            Ok(())
        }
    }
}

fn validate_text(text: &str, index: usize) -> EngineResult<()> {
    if text.trim().is_empty() {
        return Err(EngineError::validation(format!(
            "message content must not be empty at index {index}"
        )));
    }
    if text.chars().count() > MAX_CONTENT_CHARS {
        return Err(EngineError::validation(format!(
            "message content exceeds {MAX_CONTENT_CHARS} characters at index {index}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{ModelConfig, ProviderConfig, TokenCost};
    use crate::core::types::chat::{ChatMessage, MessageRole};

    fn catalog() -> std::sync::Arc<ModelCatalog> {
        ModelCatalog::new(
            vec![ModelConfig {
                model_id: "gpt-4o".into(),
                provider: "openai".into(),
                deployment: None,
                cost: TokenCost::Flat { input_per_million: 5.0, output_per_million: 15.0 },
                max_context_tokens: 128_000,
                supports_tools: true,
            }],
            vec![ProviderConfig {
                provider_id: "openai".into(),
                base_url: "https://api.openai.com/v1".into(),
                api_key_env: "OPENAI_API_KEY".into(),
            }],
        )
    }

    #[test]
    fn accepts_well_formed_text_request() {
        let req = ChatRequest::new("gpt-4o", ChatInput::Text("hello".into()));
        assert!(validate(req, &catalog()).is_ok());
    }

    #[test]
    fn rejects_unknown_model() {
        let req = ChatRequest::new("not-a-model", ChatInput::Text("hello".into()));
        assert!(validate(req, &catalog()).is_err());
    }

    #[test]
    fn rejects_empty_message_content() {
        let req = ChatRequest::new(
            "gpt-4o",
            ChatInput::Messages(vec![ChatMessage::user("   ")]),
        );
        assert!(validate(req, &catalog()).is_err());
    }

    #[test]
    fn rejects_message_sequence_with_no_user_turn() {
        let req = ChatRequest::new(
            "gpt-4o",
            ChatInput::Messages(vec![ChatMessage {
                role: MessageRole::System,
                content: crate::core::types::chat::MessageContent::Text("be nice".into()),
            }]),
        );
        assert!(validate(req, &catalog()).is_err());
    }
}
