//! Retrieval engine interface and factory.
//!
//! The two engines share one capability interface and differ entirely in
//! storage and scoring. Exactly one engine is constructed per session, chosen
//! by configuration; the factory consumes the start-up capability probe so a
//! missing optional dependency fails here, loudly, instead of at a call site.

use super::embedder::Embedder;
use super::keyword::KeywordEngine;
use super::store::create_vector_store;
use super::types::{DocumentSummary, IndexOutcome, RetrievedChunk};
use super::vector::VectorEngine;
use super::{RagError, Result};
use crate::config::{Config, EngineKind};
use crate::detection::Capabilities;
use crate::provider::Provider;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// A retrieval strategy: index documents, rank chunks for a question, and
/// enumerate what has been indexed.
#[async_trait]
pub trait RetrievalEngine: Send + Sync {
    /// Extracts, chunks, and persists one document, replacing any prior
    /// entry for the same document identifier.
    async fn index(&self, path: &Path) -> Result<IndexOutcome>;

    /// Returns up to `k` chunks ranked by descending relevance. An empty
    /// result is the normal outcome for an empty index or a question that
    /// matches nothing.
    async fn query(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>>;

    /// One summary per indexed document.
    async fn list(&self) -> Result<Vec<DocumentSummary>>;

    /// Removes every indexed document. Irreversible.
    async fn clear(&self) -> Result<()>;
}

/// Builds the engine selected by `config.rag.engine`.
///
/// The vector engine requires the embedding backend: when the capability
/// probe reports it unavailable, construction fails with
/// [`RagError::DependencyMissing`] so the caller can fall back to the keyword
/// engine.
pub async fn create_engine(
    config: &Config,
    provider: Arc<dyn Provider>,
    capabilities: &Capabilities,
) -> Result<Arc<dyn RetrievalEngine>> {
    match config.rag.engine {
        EngineKind::Keyword => {
            let engine = KeywordEngine::new(
                Path::new(&config.storage.keyword_path),
                config.rag.chunk_size,
                config.rag.chunk_overlap,
            )?;
            Ok(Arc::new(engine))
        }
        EngineKind::Vector => {
            if !capabilities.ollama {
                return Err(RagError::DependencyMissing(
                    "embedding backend (Ollama) is not available; install and start Ollama, \
                     or set rag.engine = keyword to run without it"
                        .to_string(),
                ));
            }

            let store = create_vector_store(&config.storage, config.rag.embedding_dim as u64)
                .await
                .map_err(|e| {
                    RagError::DependencyMissing(format!(
                        "vector store ({}) is not available: {}",
                        match &config.storage.storage_mode {
                            crate::config::StorageMode::Embedded { path } => path.clone(),
                            crate::config::StorageMode::Grpc { url } => url.clone(),
                        },
                        e
                    ))
                })?;

            let embedder = Embedder::new(
                provider,
                config.rag.embedding_model.clone(),
                config.rag.embedding_dim,
            );

            Ok(Arc::new(VectorEngine::new(
                embedder,
                store,
                config.rag.chunk_size,
                config.rag.chunk_overlap,
            )))
        }
    }
}
