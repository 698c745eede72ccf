use serde::Serialize;

/// Outcome of indexing one document.
#[derive(Debug, Clone, Serialize)]
pub struct IndexOutcome {
    pub file_name: String,
    pub file_path: String,
    pub num_chunks: usize,
    pub page_count: usize,
}

/// One ranked chunk returned by a retrieval engine.
///
/// Keyword scores are small keyword-overlap counts widened to `f32`; vector
/// scores are cosine similarities. Either way, higher is more relevant and
/// results arrive in descending score order.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f32,
    pub file_name: String,
    pub chunk_index: usize,
}

/// Summary of one indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub file_name: String,
    pub file_path: String,
    pub chunks: usize,
    pub pages: usize,
}

/// Deduplicated source attribution: one entry per contributing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub file: String,
    pub chunks: usize,
}

/// Canonical query result assembled by the coordinator.
///
/// Transient: created fresh per query, never persisted.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Numbered, source-annotated context blocks joined with blank lines,
    /// in ranked order. Empty when there are no results.
    pub context: String,
    /// Contributing files in first-seen rank order, with chunk counts.
    pub sources: Vec<SourceRef>,
    /// Raw chunk texts in ranked order.
    pub chunks: Vec<String>,
    pub has_results: bool,
    pub num_results: usize,
}

impl QueryResult {
    /// The normal, non-error outcome of querying an empty index.
    pub fn empty() -> Self {
        Self {
            context: String::new(),
            sources: Vec::new(),
            chunks: Vec::new(),
            has_results: false,
            num_results: 0,
        }
    }

    /// Builds the canonical result from ranked engine output.
    pub(crate) fn from_ranked(ranked: Vec<RetrievedChunk>) -> Self {
        if ranked.is_empty() {
            return Self::empty();
        }

        let mut context_parts = Vec::with_capacity(ranked.len());
        let mut sources: Vec<SourceRef> = Vec::new();
        let mut chunks = Vec::with_capacity(ranked.len());

        for (i, chunk) in ranked.iter().enumerate() {
            context_parts.push(format!(
                "[{}] (Source: {}, Chunk: {})\n{}",
                i + 1,
                chunk.file_name,
                chunk.chunk_index,
                chunk.text
            ));

            match sources.iter_mut().find(|s| s.file == chunk.file_name) {
                Some(source) => source.chunks += 1,
                None => sources.push(SourceRef {
                    file: chunk.file_name.clone(),
                    chunks: 1,
                }),
            }

            chunks.push(chunk.text.clone());
        }

        let num_results = ranked.len();

        Self {
            context: context_parts.join("\n\n"),
            sources,
            chunks,
            has_results: true,
            num_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, score: f32, file: &str, idx: usize) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            score,
            file_name: file.to_string(),
            chunk_index: idx,
        }
    }

    #[test]
    fn test_empty_result() {
        let result = QueryResult::from_ranked(vec![]);
        assert!(!result.has_results);
        assert!(result.sources.is_empty());
        assert!(result.context.is_empty());
        assert_eq!(result.num_results, 0);
    }

    #[test]
    fn test_context_blocks_are_numbered_and_attributed() {
        let result = QueryResult::from_ranked(vec![
            chunk("alpha", 2.0, "a.pdf", 0),
            chunk("beta", 1.0, "b.pdf", 3),
        ]);

        assert!(result.has_results);
        assert_eq!(result.num_results, 2);
        assert!(result.context.starts_with("[1] (Source: a.pdf, Chunk: 0)\nalpha"));
        assert!(result.context.contains("[2] (Source: b.pdf, Chunk: 3)\nbeta"));
        assert_eq!(result.chunks, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_sources_deduplicate_per_file() {
        let result = QueryResult::from_ranked(vec![
            chunk("one", 3.0, "a.pdf", 0),
            chunk("two", 2.0, "a.pdf", 1),
            chunk("three", 1.0, "b.pdf", 0),
        ]);

        assert_eq!(
            result.sources,
            vec![
                SourceRef {
                    file: "a.pdf".to_string(),
                    chunks: 2
                },
                SourceRef {
                    file: "b.pdf".to_string(),
                    chunks: 1
                },
            ]
        );
    }
}
