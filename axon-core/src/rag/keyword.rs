//! Keyword-scored retrieval engine.
//!
//! No model dependency: chunks are scored by keyword overlap with the query,
//! and the whole index is one JSON document on disk. Works instantly, low
//! memory, good enough for most document Q&A.

use super::chunker::chunk_text;
use super::engine::RetrievalEngine;
use super::types::{DocumentSummary, IndexOutcome, RetrievedChunk};
use super::Result;
use crate::document::PdfExtractor;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Question words carrying no retrieval signal.
const STOPWORDS: [&str; 11] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for",
];

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word pattern compiles"));

/// One document's entry in the persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedDocument {
    file_name: String,
    file_path: String,
    chunks: Vec<String>,
    page_count: usize,
    num_chunks: usize,
}

/// Keyword retrieval engine backed by a single JSON index file.
///
/// The index is read fully into memory at construction and every mutation
/// re-serializes the whole structure to disk synchronously. One engine
/// instance owns the persisted index exclusively; concurrent mutation of the
/// same index file from two instances is out of contract.
pub struct KeywordEngine {
    index_path: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
    documents: RwLock<BTreeMap<String, IndexedDocument>>,
}

impl KeywordEngine {
    /// Opens (or creates) the index under `persist_dir`.
    pub fn new(persist_dir: &Path, chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        fs::create_dir_all(persist_dir)?;
        let index_path = persist_dir.join("index.json");

        let documents = if index_path.exists() {
            let contents = fs::read_to_string(&index_path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            index_path,
            chunk_size,
            chunk_overlap,
            documents: RwLock::new(documents),
        })
    }

    fn save(&self, documents: &BTreeMap<String, IndexedDocument>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(documents)?;
        fs::write(&self.index_path, serialized)?;
        Ok(())
    }

    /// Lowercase word tokens of the question, minus stopwords.
    fn keywords(question: &str) -> HashSet<String> {
        let lowered = question.to_lowercase();
        WORD_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .filter(|word| !STOPWORDS.contains(&word.as_str()))
            .collect()
    }
}

#[async_trait]
impl RetrievalEngine for KeywordEngine {
    async fn index(&self, path: &Path) -> Result<IndexOutcome> {
        let document = PdfExtractor::extract(path)?;
        info!(file = %document.file_name, chars = document.full_text.len(), "Extracted document");

        let chunks = chunk_text(&document.full_text, self.chunk_size, self.chunk_overlap);
        debug!(chunks = chunks.len(), "Chunked document");

        let outcome = IndexOutcome {
            file_name: document.file_name.clone(),
            file_path: document.file_path.to_string_lossy().into_owned(),
            num_chunks: chunks.len(),
            page_count: document.page_count,
        };

        let mut documents = self.documents.write().await;
        documents.insert(
            document.document_id(),
            IndexedDocument {
                file_name: outcome.file_name.clone(),
                file_path: outcome.file_path.clone(),
                num_chunks: chunks.len(),
                chunks,
                page_count: document.page_count,
            },
        );
        self.save(&documents)?;

        info!(file = %outcome.file_name, chunks = outcome.num_chunks, "Indexed (keyword search)");
        Ok(outcome)
    }

    async fn query(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let documents = self.documents.read().await;
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let keywords = Self::keywords(question);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        // Score every chunk by how many distinct keywords it contains.
        let mut scored = Vec::new();
        for doc in documents.values() {
            for (idx, chunk) in doc.chunks.iter().enumerate() {
                let chunk_lower = chunk.to_lowercase();
                let score = keywords
                    .iter()
                    .filter(|kw| chunk_lower.contains(kw.as_str()))
                    .count();

                if score > 0 {
                    scored.push(RetrievedChunk {
                        text: chunk.clone(),
                        score: score as f32,
                        file_name: doc.file_name.clone(),
                        chunk_index: idx,
                    });
                }
            }
        }

        // Stable sort: ties keep encounter order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        debug!(results = scored.len(), "Keyword query scored");
        Ok(scored)
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .map(|doc| DocumentSummary {
                file_name: doc.file_name.clone(),
                file_path: doc.file_path.clone(),
                chunks: doc.num_chunks,
                pages: doc.page_count,
            })
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        let mut documents = self.documents.write().await;
        documents.clear();
        self.save(&documents)?;
        Ok(())
    }
}

// Direct chunk insertion for tests: bypasses PDF extraction so scoring and
// persistence can be exercised with plain text.
#[cfg(test)]
impl KeywordEngine {
    async fn insert_raw(
        &self,
        doc_id: &str,
        file_name: &str,
        chunks: Vec<String>,
        page_count: usize,
    ) -> Result<()> {
        let mut documents = self.documents.write().await;
        documents.insert(
            doc_id.to_string(),
            IndexedDocument {
                file_name: file_name.to_string(),
                file_path: format!("/docs/{file_name}"),
                num_chunks: chunks.len(),
                chunks,
                page_count,
            },
        );
        self.save(&documents)?;
        Ok(())
    }
}
