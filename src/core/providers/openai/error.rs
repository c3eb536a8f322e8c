//! Maps an OpenAI-compatible HTTP response status to an [`EngineError`].

use crate::errors::EngineError;

pub fn map_status(provider: &str, status: u16, body: &str) -> EngineError {
    match status {
        429 => EngineError::rate_limited(provider, body),
        400 | 404 => EngineError::protocol(provider, body),
        _ => EngineError::upstream(provider, format!("HTTP {status}: {body}")),
    }
}
