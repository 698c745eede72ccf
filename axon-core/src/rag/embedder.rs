//! Embedding generation using LLM providers.
//!
//! Converts chunk and query text into fixed-dimension vectors through the
//! provider's embedding model. A given model always produces vectors of the
//! same dimensionality and the same vector for the same input string.

use crate::provider::{Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during embedding generation.
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// The provider API returned an error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The API response contained no embeddings.
    #[error("No embeddings returned")]
    NoEmbeddings,

    /// The model returned vectors of an unexpected dimensionality.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedderError>;

/// Generates vector embeddings for text through a provider embedding model.
///
/// Common models:
/// - `nomic-embed-text` - 768-dimensional embeddings, good general purpose
/// - `mxbai-embed-large` - 1024-dimensional embeddings, higher quality
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
    dim: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, dim: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            dim,
        }
    }

    /// The fixed dimensionality of this embedder's vectors.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Generates a vector embedding for a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbedderError::NoEmbeddings)
    }

    /// Generates embeddings for a batch of texts, one vector per input, in
    /// input order. Dimensionality is validated against the configured size.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.provider.embed_batch(texts, &self.model).await?;

        if vectors.len() != texts.len() {
            return Err(EmbedderError::NoEmbeddings);
        }

        for vector in &vectors {
            if vector.len() != self.dim {
                return Err(EmbedderError::DimensionMismatch {
                    expected: self.dim,
                    actual: vector.len(),
                });
            }
        }

        Ok(vectors)
    }
}
