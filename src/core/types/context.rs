//! Per-call request context threaded through dispatch, retry, and metrics.

use std::time::Instant;
use uuid::Uuid;

/// Bookkeeping carried alongside a [`super::chat::ValidatedRequest`] for the
/// lifetime of a single `chat`/`achat` call, including any retries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub call_id: String,
    pub dispatched_at: Instant,
    pub attempt: u32,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            call_id: Uuid::new_v4().to_string(),
            dispatched_at: Instant::now(),
            attempt: 0,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.dispatched_at.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
