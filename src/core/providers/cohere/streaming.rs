//! Cohere's streaming wire format is newline-delimited JSON event objects
//! tagged by `event_type`, not OpenAI-style SSE `data:` framing. This module
//! transcodes that event stream into the same [`ChatChunk`] shape OpenAI and
//! Azure produce, so the Stream Normalizer never has to know the difference.

use crate::core::types::responses::{ChatChunk, ChunkChoice, Delta, Usage};
use crate::errors::EngineError;
use serde_json::Value;

pub struct CohereEventParser {
    buffer: String,
    call_id: String,
    model: String,
    finished: bool,
}

impl CohereEventParser {
    pub fn new(call_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            buffer: String::new(),
            call_id: call_id.into(),
            model: model.into(),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn push(&mut self, data: &str) -> Result<Vec<ChatChunk>, EngineError> {
        if self.finished {
            return Ok(Vec::new());
        }
        self.buffer.push_str(data);

        let mut chunks = Vec::new();
        while let Some(line_end) = self.buffer.find('\n') {
            let line = self.buffer[..line_end].trim().to_string();
            self.buffer.drain(..=line_end);
            if line.is_empty() {
                continue;
            }

            let event: Value = serde_json::from_str(&line)
                .map_err(|e| EngineError::protocol("cohere", format!("malformed stream event: {e}")))?;

            if let Some(chunk) = self.transcode(event)? {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    fn transcode(&mut self, event: Value) -> Result<Option<ChatChunk>, EngineError> {
        let event_type = event.get("event_type").and_then(Value::as_str).unwrap_or("");

        match event_type {
            "stream-start" => {
                // No content at this point; unlike OpenAI/Azure this never
                // becomes a content-less chunk the Joiner has to skip.
                Ok(None)
            }
            "text-generation" => {
                let text = event.get("text").and_then(Value::as_str).unwrap_or("").to_string();
                Ok(Some(self.wrap(Delta {
                    role: None,
                    content: Some(text),
                    tool_calls: None,
                    function_call: None,
                }, None)))
            }
            "stream-end" => {
                self.finished = true;
                let finish_reason = event
                    .get("finish_reason")
                    .and_then(Value::as_str)
                    .map(|s| s.to_lowercase())
                    .unwrap_or_else(|| "stop".to_string());

                let usage = event
                    .pointer("/response/meta/billed_units")
                    .map(|billed| {
                        let input = billed.get("input_tokens").and_then(Value::as_f64).unwrap_or(0.0) as u32;
                        let output = billed.get("output_tokens").and_then(Value::as_f64).unwrap_or(0.0) as u32;
                        Usage { prompt_tokens: input, completion_tokens: output, total_tokens: input + output }
                    });

                let mut chunk = self.wrap(Delta::default(), Some(finish_reason));
                chunk.usage = usage;
                Ok(Some(chunk))
            }
            _ => Ok(None),
        }
    }

    fn wrap(&self, delta: Delta, finish_reason: Option<String>) -> ChatChunk {
        ChatChunk {
            id: self.call_id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: 0,
            model: self.model.clone(),
            choices: vec![ChunkChoice { index: 0, delta, finish_reason }],
            usage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcodes_text_generation_events() {
        let mut parser = CohereEventParser::new("call-1", "command-r");
        let chunks = parser
            .push("{\"event_type\":\"stream-start\"}\n{\"event_type\":\"text-generation\",\"text\":\"hi\"}\n")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].choices[0].delta.content.as_deref(), Some("hi"));
    }

    #[test]
    fn stream_end_marks_finished_with_usage() {
        let mut parser = CohereEventParser::new("call-1", "command-r");
        let chunks = parser
            .push("{\"event_type\":\"stream-end\",\"finish_reason\":\"COMPLETE\",\"response\":{\"meta\":{\"billed_units\":{\"input_tokens\":10,\"output_tokens\":5}}}}\n")
            .unwrap();
        assert!(parser.is_finished());
        assert_eq!(chunks[0].choices[0].finish_reason.as_deref(), Some("complete"));
        assert_eq!(chunks[0].usage.as_ref().unwrap().total_tokens, 15);
    }
}
