//! Vector store abstraction and factory.
//!
//! The vector engine persists chunk records in a named collection of a
//! similarity index. Two backends implement the same interface: LanceDB for
//! embedded, in-process storage, and Qdrant for a remote gRPC server.

use super::lancedb_store::LanceDbStore;
use super::qdrant_store::QdrantStore;
use crate::config::{StorageConfig, StorageMode};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Metadata stored with every chunk record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Path of the source document
    pub source: String,
    pub file_name: String,
    pub chunk_index: usize,
    pub page_count: usize,
}

/// A chunk record persisted in the collection.
///
/// Record ids are `{document_id}_{chunk_index}`, so re-indexing a document
/// overwrites its prior records instead of duplicating them.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A search hit from the similarity index. Higher scores are more similar.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub text: String,
    pub score: f32,
    pub metadata: ChunkMetadata,
}

/// Unified interface for vector collection operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts records, replacing any existing records with the same ids.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()>;

    /// K-nearest-neighbour search by cosine distance.
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<VectorHit>>;

    /// Metadata of every stored record, for listings.
    async fn all_metadata(&self) -> Result<Vec<ChunkMetadata>>;

    /// Total number of records in the collection.
    async fn count(&self) -> Result<usize>;

    /// Drops and recreates the collection. Irreversible.
    async fn drop_collection(&self) -> Result<()>;
}

/// Creates a vector store instance based on the storage mode.
///
/// - `Embedded` mode uses LanceDB for zero-setup, in-process storage
/// - `Grpc` mode uses Qdrant for remote server connectivity
pub async fn create_vector_store(
    storage_config: &StorageConfig,
    vector_size: u64,
) -> Result<Arc<dyn VectorStore>> {
    let collection_name = storage_config.vector_db.collection_name.clone();

    match &storage_config.storage_mode {
        StorageMode::Embedded { path } => {
            let store = LanceDbStore::connect(path, &collection_name, vector_size).await?;
            Ok(Arc::new(store))
        }
        StorageMode::Grpc { url } => {
            let store = QdrantStore::connect(url, &collection_name, vector_size).await?;
            Ok(Arc::new(store))
        }
    }
}
