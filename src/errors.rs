//! Engine-wide error taxonomy
//!
//! One variant per error kind the dispatch engine can surface. Mirrors the
//! propagation policy in the spec: validation and protocol errors are
//! terminal, rate limits are retryable up to the caller's budget, and every
//! other upstream failure is terminal.

use thiserror::Error;

/// Top-level error type returned by the engine's `chat`/`achat` entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Request shape or parameter range failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested provider id has no registered implementation.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The requested model is absent from the provider's model catalog.
    #[error("unsupported model '{model}' for provider '{provider}'")]
    UnsupportedModel { provider: String, model: String },

    /// Upstream signalled throttling; eligible for retry up to the request's budget.
    #[error("rate limited by {provider}: {message}")]
    RateLimited { provider: String, message: String },

    /// Any other upstream failure (auth, network, 5xx). Fatal to the call.
    #[error("upstream error from {provider}: {message}")]
    Upstream { provider: String, message: String },

    /// Malformed upstream chunk or an unrecognized `finish_reason`.
    #[error("protocol error from {provider}: {message}")]
    Protocol { provider: String, message: String },

    /// The caller abandoned the call before it completed.
    #[error("call cancelled")]
    Cancelled,

    /// Engine configuration failed validation at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unsupported_model(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::UnsupportedModel {
            provider: provider.into(),
            model: model.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn protocol(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True if the caller's retry budget should be consumed and dispatch retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// HTTP status the (out-of-scope) proxy should map this error to.
    ///
    /// Kept as a pure data mapping per the spec's external-interfaces section;
    /// the core never opens a socket itself.
    pub fn to_http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 422,
            Self::UnknownProvider(_) | Self::UnsupportedModel { .. } => 400,
            Self::RateLimited { .. } => 429,
            Self::Upstream { .. } | Self::Protocol { .. } | Self::Configuration(_) => 500,
            Self::Cancelled => 499,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
