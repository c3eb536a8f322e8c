use crate::errors::EngineError;

pub fn map_status(status: u16, body: &str) -> EngineError {
    match status {
        429 => EngineError::rate_limited("azure", body),
        400 | 404 => EngineError::protocol("azure", body),
        _ => EngineError::upstream("azure", format!("HTTP {status}: {body}")),
    }
}
