//! Retrieval Augmented Generation (RAG) subsystem.
//!
//! Given raw document bytes, produce a durable, queryable retrieval index;
//! given a natural-language question, return ranked, attributed context
//! usable to augment a generation prompt. The pipeline:
//!
//! 1. **Indexing**: a PDF is extracted to text, split into overlapping
//!    chunks, and persisted by the active engine (with embeddings when the
//!    vector engine is active).
//! 2. **Retrieval**: the active engine scores and ranks chunks for a
//!    question.
//! 3. **Augmentation**: the [`Retriever`] assembles numbered, source-
//!    attributed context blocks and a deduplicated source list; the chat
//!    layer embeds them into the generation prompt.
//!
//! Two interchangeable engines implement the same interface: a keyword-
//! scored engine with no model dependency and an embedding-vector engine
//! backed by a similarity index. Exactly one is active per session.

mod chunker;
mod embedder;
mod engine;
mod keyword;
mod lancedb_store;
mod qdrant_store;
mod store;
mod types;
mod vector;

pub use chunker::chunk_text;
pub use embedder::EmbedderError;
pub use engine::RetrievalEngine;
pub use keyword::KeywordEngine;
pub use types::{DocumentSummary, IndexOutcome, QueryResult, RetrievedChunk, SourceRef};

use crate::config::Config;
use crate::detection::Capabilities;
use crate::document::ExtractError;
use crate::provider::Provider;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Embedding error: {0}")]
    Embedder(#[from] EmbedderError),

    #[error("Index persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Index serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Vector store error: {0}")]
    Store(String),

    /// An optional dependency required by the configured engine is missing.
    /// Surfaced at construction so the caller can fall back to the keyword
    /// engine.
    #[error("Missing capability: {0}")]
    DependencyMissing(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

/// Template wrapping a user question in retrieved context.
fn augmented_prompt(context: &str, question: &str) -> String {
    format!(
        "Use the following context from the user's documents to answer the question.\n\n\
         Context:\n{context}\n\nQuestion: {question}"
    )
}

/// Uniform query/index interface over the active retrieval engine.
///
/// The retriever dispatches to whichever engine the configuration selected
/// and normalizes engine output into the canonical [`QueryResult`]: numbered,
/// source-annotated context blocks plus a deduplicated source list.
pub struct Retriever {
    engine: Arc<dyn RetrievalEngine>,
}

impl Retriever {
    /// Builds the configured engine and wraps it.
    ///
    /// # Errors
    ///
    /// [`RagError::DependencyMissing`] when the configured engine needs a
    /// capability the start-up probe found unavailable.
    pub async fn new(
        config: &Config,
        provider: Arc<dyn Provider>,
        capabilities: &Capabilities,
    ) -> Result<Self> {
        let engine = engine::create_engine(config, provider, capabilities).await?;
        Ok(Self { engine })
    }

    /// Wraps an already-constructed engine.
    pub fn from_engine(engine: Arc<dyn RetrievalEngine>) -> Self {
        Self { engine }
    }

    /// Indexes one PDF document, replacing any prior entry for the same
    /// document identifier.
    pub async fn index(&self, path: &Path) -> Result<IndexOutcome> {
        self.engine.index(path).await
    }

    /// Retrieves up to `k` ranked chunks and assembles the canonical result.
    ///
    /// An empty index or a question matching nothing yields
    /// `has_results = false` with empty context and sources; this is a normal
    /// outcome, not an error.
    pub async fn query(&self, question: &str, k: usize) -> Result<QueryResult> {
        let ranked = self.engine.query(question, k).await?;
        debug!(results = ranked.len(), "Assembling query result");
        Ok(QueryResult::from_ranked(ranked))
    }

    /// One summary per indexed document.
    pub async fn list(&self) -> Result<Vec<DocumentSummary>> {
        self.engine.list().await
    }

    /// Removes every indexed document. Irreversible.
    pub async fn clear(&self) -> Result<()> {
        self.engine.clear().await
    }

    /// Wraps `question` in the augmentation template when retrieval produced
    /// results; otherwise returns the question unchanged. The conversation
    /// history must keep recording the original question either way.
    pub fn augment(question: &str, result: &QueryResult) -> String {
        if result.has_results {
            augmented_prompt(&result.context, question)
        } else {
            question.to_string()
        }
    }

    /// "Sources" footer naming the contributing files, present only when
    /// retrieval had results.
    pub fn sources_footer(result: &QueryResult) -> Option<String> {
        if !result.has_results || result.sources.is_empty() {
            return None;
        }

        let lines = result
            .sources
            .iter()
            .map(|s| format!("- {} ({} chunks)", s.file, s.chunks))
            .collect::<Vec<_>>()
            .join("\n");

        Some(format!("\n\nSources:\n{lines}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedEngine {
        ranked: Vec<RetrievedChunk>,
    }

    #[async_trait]
    impl RetrievalEngine for CannedEngine {
        async fn index(&self, _path: &Path) -> Result<IndexOutcome> {
            unimplemented!("not used in these tests")
        }

        async fn query(&self, _question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
            let mut ranked = self.ranked.clone();
            ranked.truncate(k);
            Ok(ranked)
        }

        async fn list(&self) -> Result<Vec<DocumentSummary>> {
            Ok(Vec::new())
        }

        async fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    fn retriever_with(ranked: Vec<RetrievedChunk>) -> Retriever {
        Retriever::from_engine(Arc::new(CannedEngine { ranked }))
    }

    #[tokio::test]
    async fn test_empty_engine_output_is_no_results() {
        let retriever = retriever_with(vec![]);
        let result = retriever.query("question", 5).await.unwrap();

        assert!(!result.has_results);
        assert!(result.sources.is_empty());
        assert_eq!(Retriever::augment("question", &result), "question");
        assert!(Retriever::sources_footer(&result).is_none());
    }

    #[tokio::test]
    async fn test_augment_embeds_context_and_question() {
        let retriever = retriever_with(vec![RetrievedChunk {
            text: "Paris is the capital of France.".to_string(),
            score: 2.0,
            file_name: "geo.pdf".to_string(),
            chunk_index: 4,
        }]);
        let result = retriever.query("capital of France?", 5).await.unwrap();

        assert!(result.has_results);
        let prompt = Retriever::augment("capital of France?", &result);
        assert!(prompt.contains("[1] (Source: geo.pdf, Chunk: 4)"));
        assert!(prompt.contains("Paris is the capital of France."));
        assert!(prompt.ends_with("Question: capital of France?"));
    }

    #[tokio::test]
    async fn test_sources_footer_lists_files_once() {
        let chunk = |idx: usize| RetrievedChunk {
            text: format!("chunk {idx}"),
            score: 1.0,
            file_name: "geo.pdf".to_string(),
            chunk_index: idx,
        };
        let retriever = retriever_with(vec![chunk(0), chunk(1)]);
        let result = retriever.query("anything", 5).await.unwrap();

        let footer = Retriever::sources_footer(&result).unwrap();
        assert_eq!(footer, "\n\nSources:\n- geo.pdf (2 chunks)");
    }
}
