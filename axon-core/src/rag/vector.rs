//! Embedding-vector retrieval engine.
//!
//! Chunks are embedded through the provider's embedding model and persisted
//! in a named collection of a similarity index; queries run k-nearest-
//! neighbour search by cosine distance.

use super::chunker::chunk_text;
use super::embedder::Embedder;
use super::engine::RetrievalEngine;
use super::store::{ChunkMetadata, VectorRecord, VectorStore};
use super::types::{DocumentSummary, IndexOutcome, RetrievedChunk};
use super::{RagError, Result};
use crate::document::{ExtractedDocument, PdfExtractor};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Embedding batch size for indexing.
const EMBED_BATCH_SIZE: usize = 32;

pub struct VectorEngine {
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl VectorEngine {
    pub fn new(
        embedder: Embedder,
        store: Arc<dyn VectorStore>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            chunk_size,
            chunk_overlap,
        }
    }
}

impl VectorEngine {
    async fn index_chunks(
        &self,
        document: &ExtractedDocument,
        chunks: Vec<String>,
    ) -> Result<IndexOutcome> {
        // Embed every chunk before writing anything: indexing is atomic per
        // document, so an embedding failure leaves no partial records behind.
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let vectors = self.embedder.embed_batch(batch).await?;
            embeddings.extend(vectors);
        }
        debug!(embeddings = embeddings.len(), "Generated embeddings");

        let doc_id = document.document_id();
        let source = document.file_path.to_string_lossy().into_owned();

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| VectorRecord {
                id: format!("{}_{}", doc_id, i),
                embedding,
                text: chunk.clone(),
                metadata: ChunkMetadata {
                    source: source.clone(),
                    file_name: document.file_name.clone(),
                    chunk_index: i,
                    page_count: document.page_count,
                },
            })
            .collect();

        self.store
            .upsert(records)
            .await
            .map_err(|e| RagError::Store(e.to_string()))?;

        info!(file = %document.file_name, chunks = chunks.len(), "Indexed (vector search)");

        Ok(IndexOutcome {
            file_name: document.file_name.clone(),
            file_path: source,
            num_chunks: chunks.len(),
            page_count: document.page_count,
        })
    }
}

#[async_trait]
impl RetrievalEngine for VectorEngine {
    async fn index(&self, path: &Path) -> Result<IndexOutcome> {
        let document = PdfExtractor::extract(path)?;
        info!(file = %document.file_name, chars = document.full_text.len(), "Extracted document");

        let chunks = chunk_text(&document.full_text, self.chunk_size, self.chunk_overlap);
        debug!(chunks = chunks.len(), "Chunked document");

        self.index_chunks(&document, chunks).await
    }

    async fn query(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let count = self
            .store
            .count()
            .await
            .map_err(|e| RagError::Store(e.to_string()))?;
        if count == 0 {
            debug!("Vector collection is empty");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(question).await?;
        let hits = self
            .store
            .search(&query_embedding, k)
            .await
            .map_err(|e| RagError::Store(e.to_string()))?;

        debug!(results = hits.len(), "Vector query returned");

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                text: hit.text,
                score: hit.score,
                file_name: hit.metadata.file_name,
                chunk_index: hit.metadata.chunk_index,
            })
            .collect())
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let metadata = self
            .store
            .all_metadata()
            .await
            .map_err(|e| RagError::Store(e.to_string()))?;

        // Group records by source file.
        let mut grouped: BTreeMap<String, DocumentSummary> = BTreeMap::new();
        for meta in metadata {
            grouped
                .entry(meta.file_name.clone())
                .and_modify(|summary| summary.chunks += 1)
                .or_insert(DocumentSummary {
                    file_name: meta.file_name,
                    file_path: meta.source,
                    chunks: 1,
                    pages: meta.page_count,
                });
        }

        Ok(grouped.into_values().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.store
            .drop_collection()
            .await
            .map_err(|e| RagError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatChunk, ChatRequest, Provider, ProviderError};
    use crate::rag::store::VectorHit;
    use anyhow::Result as AnyResult;
    use tokio::sync::mpsc;
    use tokio::sync::Mutex;

    const DIM: usize = 8;

    /// Deterministic embedding: a letter-bucket histogram, L2-normalized.
    /// Texts sharing words land close together under cosine similarity.
    fn toy_embedding(text: &str) -> Vec<f32> {
        let mut buckets = [0.0f32; DIM];
        for c in text.to_lowercase().chars().filter(|c| c.is_alphanumeric()) {
            buckets[(c as usize) % DIM] += 1.0;
        }
        let norm = buckets.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            buckets.iter().map(|x| x / norm).collect()
        } else {
            buckets.to_vec()
        }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    struct MockProvider {
        fail_embeddings: bool,
    }

    #[async_trait]
    impl Provider for MockProvider {
        async fn chat(
            &self,
            _request: ChatRequest,
            _tx: mpsc::Sender<ChatChunk>,
        ) -> crate::provider::Result<()> {
            Ok(())
        }

        async fn embed_batch(
            &self,
            texts: &[String],
            _model: &str,
        ) -> crate::provider::Result<Vec<Vec<f32>>> {
            if self.fail_embeddings {
                return Err(ProviderError::Api("embedding backend down".to_string()));
            }
            Ok(texts.iter().map(|t| toy_embedding(t)).collect())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<VectorRecord>>,
    }

    #[async_trait]
    impl VectorStore for MemoryStore {
        async fn upsert(&self, records: Vec<VectorRecord>) -> AnyResult<()> {
            let mut stored = self.records.lock().await;
            for record in records {
                stored.retain(|r| r.id != record.id);
                stored.push(record);
            }
            Ok(())
        }

        async fn search(&self, query_embedding: &[f32], k: usize) -> AnyResult<Vec<VectorHit>> {
            let stored = self.records.lock().await;
            let mut hits: Vec<VectorHit> = stored
                .iter()
                .map(|r| VectorHit {
                    text: r.text.clone(),
                    score: cosine(&r.embedding, query_embedding),
                    metadata: r.metadata.clone(),
                })
                .collect();
            hits.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            hits.truncate(k);
            Ok(hits)
        }

        async fn all_metadata(&self) -> AnyResult<Vec<ChunkMetadata>> {
            let stored = self.records.lock().await;
            Ok(stored.iter().map(|r| r.metadata.clone()).collect())
        }

        async fn count(&self) -> AnyResult<usize> {
            Ok(self.records.lock().await.len())
        }

        async fn drop_collection(&self) -> AnyResult<()> {
            self.records.lock().await.clear();
            Ok(())
        }
    }

    fn engine_with(store: Arc<MemoryStore>, fail_embeddings: bool) -> VectorEngine {
        let provider = Arc::new(MockProvider { fail_embeddings });
        let embedder = Embedder::new(provider, "toy-embed", DIM);
        VectorEngine::new(embedder, store, 500, 50)
    }

    #[tokio::test]
    async fn test_query_on_empty_collection_returns_nothing() {
        let store = Arc::new(MemoryStore::default());
        let engine = engine_with(store, false);

        let results = engine.query("anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity() {
        let store = Arc::new(MemoryStore::default());
        store
            .upsert(vec![
                VectorRecord {
                    id: "notes_0".to_string(),
                    embedding: toy_embedding("paris is the capital of france"),
                    text: "paris is the capital of france".to_string(),
                    metadata: ChunkMetadata {
                        source: "/docs/notes.pdf".to_string(),
                        file_name: "notes.pdf".to_string(),
                        chunk_index: 0,
                        page_count: 2,
                    },
                },
                VectorRecord {
                    id: "notes_1".to_string(),
                    embedding: toy_embedding("zzz qqq jjj xxx"),
                    text: "zzz qqq jjj xxx".to_string(),
                    metadata: ChunkMetadata {
                        source: "/docs/notes.pdf".to_string(),
                        file_name: "notes.pdf".to_string(),
                        chunk_index: 1,
                        page_count: 2,
                    },
                },
            ])
            .await
            .unwrap();

        let engine = engine_with(store, false);
        let results = engine
            .query("what is the capital of france", 1)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk_index, 0);
        assert_eq!(results[0].file_name, "notes.pdf");
    }

    #[tokio::test]
    async fn test_embedding_failure_persists_nothing() {
        let store = Arc::new(MemoryStore::default());
        let engine = engine_with(Arc::clone(&store), true);

        let document = ExtractedDocument {
            full_text: "alpha\n\nbeta".to_string(),
            pages: vec![],
            page_count: 2,
            file_name: "broken.pdf".to_string(),
            file_path: "/docs/broken.pdf".into(),
        };

        let err = engine
            .index_chunks(&document, vec!["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::Embedder(_)));
        // Atomic per-document indexing: the failed call wrote nothing.
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reindexing_overwrites_by_id() {
        let store = Arc::new(MemoryStore::default());
        let engine = engine_with(Arc::clone(&store), false);

        let document = ExtractedDocument {
            full_text: "alpha\n\nbeta".to_string(),
            pages: vec![],
            page_count: 2,
            file_name: "notes.pdf".to_string(),
            file_path: "/docs/notes.pdf".into(),
        };

        let chunks = vec!["alpha".to_string(), "beta".to_string()];
        let outcome = engine
            .index_chunks(&document, chunks.clone())
            .await
            .unwrap();
        assert_eq!(outcome.num_chunks, 2);
        assert_eq!(store.count().await.unwrap(), 2);

        // Same document id, same chunk ids: records are replaced, not added.
        engine.index_chunks(&document, chunks).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_query_embedding_failure_surfaces() {
        let store = Arc::new(MemoryStore::default());
        store
            .upsert(vec![VectorRecord {
                id: "x_0".to_string(),
                embedding: toy_embedding("text"),
                text: "text".to_string(),
                metadata: ChunkMetadata {
                    source: "/docs/x.pdf".to_string(),
                    file_name: "x.pdf".to_string(),
                    chunk_index: 0,
                    page_count: 1,
                },
            }])
            .await
            .unwrap();

        let engine = engine_with(Arc::clone(&store), true);
        let err = engine.query("text", 5).await.unwrap_err();
        assert!(matches!(err, RagError::Embedder(_)));
    }

    #[tokio::test]
    async fn test_list_groups_by_source_file() {
        let store = Arc::new(MemoryStore::default());
        let engine = engine_with(Arc::clone(&store), false);

        let meta = |file: &str, idx: usize| ChunkMetadata {
            source: format!("/docs/{file}"),
            file_name: file.to_string(),
            chunk_index: idx,
            page_count: 3,
        };
        store
            .upsert(vec![
                VectorRecord {
                    id: "a_0".to_string(),
                    embedding: toy_embedding("one"),
                    text: "one".to_string(),
                    metadata: meta("a.pdf", 0),
                },
                VectorRecord {
                    id: "a_1".to_string(),
                    embedding: toy_embedding("two"),
                    text: "two".to_string(),
                    metadata: meta("a.pdf", 1),
                },
                VectorRecord {
                    id: "b_0".to_string(),
                    embedding: toy_embedding("three"),
                    text: "three".to_string(),
                    metadata: meta("b.pdf", 0),
                },
            ])
            .await
            .unwrap();

        let docs = engine.list().await.unwrap();
        assert_eq!(docs.len(), 2);
        let a = docs.iter().find(|d| d.file_name == "a.pdf").unwrap();
        assert_eq!(a.chunks, 2);
        assert_eq!(a.pages, 3);
    }

    #[tokio::test]
    async fn test_clear_drops_collection() {
        let store = Arc::new(MemoryStore::default());
        let engine = engine_with(Arc::clone(&store), false);

        store
            .upsert(vec![VectorRecord {
                id: "a_0".to_string(),
                embedding: toy_embedding("one"),
                text: "one".to_string(),
                metadata: ChunkMetadata {
                    source: "/docs/a.pdf".to_string(),
                    file_name: "a.pdf".to_string(),
                    chunk_index: 0,
                    page_count: 1,
                },
            }])
            .await
            .unwrap();

        engine.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
