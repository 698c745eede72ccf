//! axon-core - Local-first retrieval-augmented agent engine
//!
//! Provides the foundational components for document Q&A against local LLMs:
//! - LLM provider abstraction (Ollama)
//! - Retrieval subsystem: PDF extraction, chunking, and two interchangeable
//!   engines (keyword-scored and embedding-vector)
//! - Chat orchestration with sessions, streaming, tools, and transparent
//!   retrieval augmentation
//! - Configuration and capability detection

// Public modules
pub mod chat;
pub mod config;
pub mod detection;
pub mod document;
pub mod provider;
pub mod rag;

// Public exports
pub use chat::{ChatManager, Session};
pub use config::{Config, EngineKind};
pub use detection::{check_ollama_silent, detect_ollama, Capabilities, DetectionError, OllamaInfo};
pub use document::{ExtractError, ExtractedDocument, PdfExtractor};
pub use rag::{
    DocumentSummary, IndexOutcome, KeywordEngine, QueryResult, RagError, RetrievalEngine,
    Retriever, SourceRef,
};

// Provider exports
pub use provider::{
    ChatChunk, ChatRequest, Message, OllamaProvider, Provider, ProviderError, Tool, ToolCall,
    ToolCallFunction, ToolFunction,
};
