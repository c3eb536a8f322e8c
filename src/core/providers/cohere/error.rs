use crate::errors::EngineError;

pub fn map_status(status: u16, body: &str) -> EngineError {
    match status {
        429 => EngineError::rate_limited("cohere", body),
        400 | 404 => EngineError::protocol("cohere", body),
        _ => EngineError::upstream("cohere", format!("HTTP {status}: {body}")),
    }
}
