//! Reconstructs a single logical completion from a sequence of streamed
//! chunks, mirroring the shape produced by a non-stream completion.

use crate::core::types::responses::{
    ChatChunk, ChatCompletionMessage, ChatCompletionMessageToolCall, FunctionCall,
};
use crate::core::types::MessageRole;
use crate::errors::{EngineError, EngineResult};

/// The Joiner's output: a synthesized completion message plus its
/// canonical string form for tokenization by the Metrics Engine.
pub struct JoinedCompletion {
    pub message: ChatCompletionMessage,
    pub finish_reason: String,
    pub canonical_output: String,
}

/// Reassembles `chunks` according to the terminal `finish_reason` carried by
/// the last chunk's last choice. `skip_role_marker_chunk` is the provider's
/// data property: true when chunk 0 carries only a role marker.
pub fn join(
    chunks: &[ChatChunk],
    provider: &str,
    skip_role_marker_chunk: bool,
) -> EngineResult<JoinedCompletion> {
    let last_choice = chunks
        .last()
        .and_then(|c| c.choices.first())
        .ok_or_else(|| EngineError::protocol(provider, "stream ended with no chunks"))?;

    let finish_reason = last_choice
        .finish_reason
        .clone()
        .ok_or_else(|| EngineError::protocol(provider, "terminal chunk carries no finish_reason"))?;

    match finish_reason.as_str() {
        "stop" | "length" => join_text(chunks, skip_role_marker_chunk),
        "tool_calls" => join_tool_calls(chunks, provider),
        "function_call" => join_function_call(chunks, provider),
        other => Err(EngineError::protocol(
            provider,
            format!("unknown finish_reason '{other}'"),
        )),
    }
}

fn join_text(chunks: &[ChatChunk], skip_role_marker_chunk: bool) -> EngineResult<JoinedCompletion> {
    let start = if skip_role_marker_chunk { 1 } else { 0 };
    let mut content = String::new();
    for chunk in chunks.iter().skip(start) {
        if let Some(choice) = chunk.choices.first() {
            if let Some(text) = &choice.delta.content {
                content.push_str(text);
            }
        }
    }

    Ok(JoinedCompletion {
        message: ChatCompletionMessage {
            role: MessageRole::Assistant,
            content: Some(content.clone()),
            tool_calls: None,
            function_call: None,
        },
        finish_reason: "stop".to_string(),
        canonical_output: content,
    })
}

fn join_tool_calls(chunks: &[ChatChunk], provider: &str) -> EngineResult<JoinedCompletion> {
    let mut id = None;
    let mut call_type = None;
    let mut name = None;
    let mut arguments = String::new();

    for chunk in chunks {
        let Some(choice) = chunk.choices.first() else { continue };
        let Some(tool_calls) = &choice.delta.tool_calls else { continue };
        let Some(delta) = tool_calls.first() else { continue };

        if id.is_none() {
            id = delta.id.clone();
            call_type = delta.call_type.clone();
        }
        if let Some(function) = &delta.function {
            if name.is_none() {
                name = function.name.clone();
            }
            if let Some(fragment) = &function.arguments {
                arguments.push_str(fragment);
            }
        }
    }

    let id = id.ok_or_else(|| EngineError::protocol(provider, "tool_calls stream carried no call id"))?;
    let name = name.ok_or_else(|| EngineError::protocol(provider, "tool_calls stream carried no function name"))?;

    let tool_call = ChatCompletionMessageToolCall {
        id,
        call_type: call_type.unwrap_or_else(|| "function".to_string()),
        function: FunctionCall { name, arguments: arguments.clone() },
    };

    Ok(JoinedCompletion {
        message: ChatCompletionMessage {
            role: MessageRole::Assistant,
            content: None,
            tool_calls: Some(vec![tool_call]),
            function_call: None,
        },
        finish_reason: "tool_calls".to_string(),
        canonical_output: arguments,
    })
}

fn join_function_call(chunks: &[ChatChunk], provider: &str) -> EngineResult<JoinedCompletion> {
    let mut name = None;
    let mut arguments = String::new();

    for chunk in chunks {
        let Some(choice) = chunk.choices.first() else { continue };
        let Some(delta) = &choice.delta.function_call else { continue };
        if name.is_none() {
            name = delta.name.clone();
        }
        if let Some(fragment) = &delta.arguments {
            arguments.push_str(fragment);
        }
    }

    let name = name.ok_or_else(|| EngineError::protocol(provider, "function_call stream carried no name"))?;

    Ok(JoinedCompletion {
        message: ChatCompletionMessage {
            role: MessageRole::Assistant,
            content: None,
            tool_calls: None,
            function_call: Some(FunctionCall { name, arguments: arguments.clone() }),
        },
        finish_reason: "function_call".to_string(),
        canonical_output: arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::responses::{ChunkChoice, Delta, FunctionCallDelta, ToolCallDelta};

    fn chunk(delta: Delta, finish_reason: Option<&str>) -> ChatChunk {
        ChatChunk {
            id: "c".into(),
            object: "chat.completion.chunk".into(),
            created: 0,
            model: "gpt-4o".into(),
            choices: vec![ChunkChoice { index: 0, delta, finish_reason: finish_reason.map(str::to_string) }],
            usage: None,
        }
    }

    #[test]
    fn joins_text_skipping_role_marker_chunk() {
        let chunks = vec![
            chunk(Delta { role: Some(MessageRole::Assistant), ..Default::default() }, None),
            chunk(Delta { content: Some("Hel".into()), ..Default::default() }, None),
            chunk(Delta { content: Some("lo".into()), ..Default::default() }, Some("stop")),
        ];
        let joined = join(&chunks, "openai", true).unwrap();
        assert_eq!(joined.canonical_output, "Hello");
        assert_eq!(joined.message.content.as_deref(), Some("Hello"));
    }

    #[test]
    fn round_trip_single_character_chunks_reconstructs_original() {
        let original = "The quick brown fox";
        let mut chunks: Vec<ChatChunk> = original
            .chars()
            .map(|c| chunk(Delta { content: Some(c.to_string()), ..Default::default() }, None))
            .collect();
        let last = chunks.len() - 1;
        chunks[last].choices[0].finish_reason = Some("stop".to_string());

        let joined = join(&chunks, "cohere", false).unwrap();
        assert_eq!(joined.canonical_output, original);
    }

    #[test]
    fn joins_tool_call_argument_fragments() {
        let chunks = vec![
            chunk(
                Delta {
                    tool_calls: Some(vec![ToolCallDelta {
                        index: 0,
                        id: Some("call_1".into()),
                        call_type: Some("function".into()),
                        function: Some(FunctionCallDelta { name: Some("lookup".into()), arguments: Some("{\"q".into()) }),
                    }]),
                    ..Default::default()
                },
                None,
            ),
            chunk(
                Delta {
                    tool_calls: Some(vec![ToolCallDelta {
                        index: 0,
                        id: None,
                        call_type: None,
                        function: Some(FunctionCallDelta { name: None, arguments: Some("\":1}".into()) }),
                    }]),
                    ..Default::default()
                },
                Some("tool_calls"),
            ),
        ];

        let joined = join(&chunks, "openai", true).unwrap();
        assert_eq!(joined.canonical_output, "{\"q\":1}");
        let tool_calls = joined.message.tool_calls.unwrap();
        assert_eq!(tool_calls[0].function.name, "lookup");
        assert_eq!(tool_calls[0].function.arguments, "{\"q\":1}");
    }

    #[test]
    fn rejects_unknown_finish_reason() {
        let chunks = vec![chunk(Delta::default(), Some("weird"))];
        assert!(join(&chunks, "openai", true).is_err());
    }
}
