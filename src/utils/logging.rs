//! Structured logging setup.
//!
//! A single `tracing_subscriber::fmt` layer, level controlled by `RUST_LOG`
//! (falling back to `info`). Never pass an upstream API key or raw message
//! content to `tracing` fields — provider adapters log request/response
//! shape (model, status, byte counts) and nothing from `chat_input`.

use tracing::Level;
use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}

pub fn init_with_level(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}
