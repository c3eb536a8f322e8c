pub mod chat;
pub mod context;
pub mod envelope;
pub mod responses;

pub use chat::{ChatInput, ChatMessage, ChatRequest, ContentPart, MessageContent, MessageRole, ValidatedRequest};
pub use context::RequestContext;
pub use envelope::{Envelope, Metrics};
pub use responses::{ChatChunk, ChatResponse, Choice, ChunkChoice, Delta, Usage};
