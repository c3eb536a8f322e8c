//! Server-Sent Events parsing for OpenAI-compatible streaming responses.

use crate::core::types::responses::ChatChunk;
use crate::errors::EngineError;

/// Incremental SSE buffer. Feed raw byte chunks from the HTTP body as they
/// arrive; each call may yield zero or more complete `ChatChunk`s.
pub struct SseParser {
    provider: &'static str,
    buffer: String,
    finished: bool,
}

impl SseParser {
    pub fn new(provider: &'static str) -> Self {
        Self { provider, buffer: String::new(), finished: false }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Parses as many complete `data:` lines as the buffer currently holds.
    pub fn push(&mut self, data: &str) -> Result<Vec<ChatChunk>, EngineError> {
        if self.finished {
            return Ok(Vec::new());
        }
        self.buffer.push_str(data);

        let mut chunks = Vec::new();
        while let Some(line_end) = self.buffer.find('\n') {
            let line = self.buffer[..line_end].trim_end_matches('\r').to_string();
            self.buffer.drain(..=line_end);

            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let Some(payload) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) else {
                continue;
            };

            if payload.trim() == "[DONE]" {
                self.finished = true;
                return Ok(chunks);
            }

            let chunk: ChatChunk = serde_json::from_str(payload.trim()).map_err(|e| {
                EngineError::protocol(self.provider, format!("malformed stream chunk: {e}"))
            })?;
            chunks.push(chunk);
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_complete_event() {
        let mut parser = SseParser::new("openai");
        let data = "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"created\":1,\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n";
        let chunks = parser.push(data).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].choices[0].delta.content.as_deref(), Some("Hi"));
    }

    #[test]
    fn recognizes_done_sentinel() {
        let mut parser = SseParser::new("openai");
        let chunks = parser.push("data: [DONE]\n\n").unwrap();
        assert!(chunks.is_empty());
        assert!(parser.is_finished());
    }

    #[test]
    fn buffers_across_partial_writes() {
        let mut parser = SseParser::new("openai");
        let part1 = "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\"";
        let part2 = ",\"created\":1,\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n";
        assert!(parser.push(part1).unwrap().is_empty());
        let chunks = parser.push(part2).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn rejects_malformed_json() {
        let mut parser = SseParser::new("openai");
        assert!(parser.push("data: {not json}\n\n").is_err());
    }
}
