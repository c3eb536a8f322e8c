//! Provider-agnostic chat dispatch and streaming normalization.
//!
//! [`Engine::achat`] and [`Engine::chat`] are the two entry points: both
//! validate the request against a [`config::EngineConfig`]-built catalog,
//! dispatch through the matching [`core::providers::LlmProvider`] adapter
//! with retry on rate limits, and normalize the result into one or more
//! canonical [`core::types::envelope::Envelope`] values.

pub mod config;
pub mod core;
pub mod errors;
pub mod utils;

pub use core::engine::{Engine, EnvelopeOrBlockingIter, EnvelopeOrStream};
pub use core::providers::{LlmProvider, ProviderRegistry};
pub use core::types::chat::{ChatInput, ChatMessage, ChatRequest, MessageRole};
pub use core::types::envelope::{Envelope, Metrics};
pub use errors::{EngineError, EngineResult};
