//! LLM provider abstraction layer.
//!
//! Defines the boundary contract the orchestration core has with a generation
//! backend: a streaming chat completion and batch embedding generation. The
//! core only ever hands a provider a fully-formed message list and never
//! inspects its internals.

pub mod ollama;
mod types;

// Re-export common types
pub use types::{
    ChatChunk, ChatRequest, EmbedRequest, EmbedResponse, Message, Provider, ProviderError, Result,
    Tool, ToolCall, ToolCallFunction, ToolFunction,
};

// Re-export provider implementations
pub use ollama::OllamaProvider;
