//! End-to-end retrieval tests: extract → chunk → index → query → reload,
//! driven through hand-built PDFs and the keyword engine.

use axon_core::rag::{KeywordEngine, Retriever};
use axon_core::{ExtractError, PdfExtractor};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Builds a minimal valid PDF with one text showing per page. Body first,
/// then an xref with correct byte offsets so the parser accepts it.
fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let n = pages.len();
    let font_id = 3 + 2 * n;

    let escape = |text: &str| {
        text.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    };

    let mut out: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");

    let kids = (0..n)
        .map(|i| format!("{} 0 R", 3 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "2 0 obj << /Type /Pages /Kids [{}] /Count {} >> endobj\n",
            kids, n
        )
        .as_bytes(),
    );

    for (i, text) in pages.iter().enumerate() {
        let page_id = 3 + 2 * i;
        let content_id = 4 + 2 * i;

        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Contents {} 0 R /Resources << /Font << /F1 {} 0 R >> >> >> endobj\n",
                page_id, content_id, font_id
            )
            .as_bytes(),
        );

        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET\n", escape(text))
        };
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Length {} >> stream\n{}endstream endobj\n",
                content_id,
                stream.len(),
                stream
            )
            .as_bytes(),
        );
    }

    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "{} 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
            font_id
        )
        .as_bytes(),
    );

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", font_id + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!("trailer << /Size {} /Root 1 0 R >>\nstartxref\n", font_id + 1).as_bytes(),
    );
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

fn write_pdf(dir: &TempDir, name: &str, pages: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, build_pdf(pages)).unwrap();
    path
}

/// Deterministic filler without sentence punctuation, `target` characters.
fn filler(target: usize) -> String {
    let words = [
        "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed",
        "tempor", "incididunt", "labore", "dolore", "magna", "aliqua",
    ];
    let mut text = String::new();
    let mut i = 0;
    while text.len() < target {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(words[i % words.len()]);
        i += 1;
    }
    text.truncate(target);
    text.trim_end().to_string()
}

fn keyword_retriever(dir: &TempDir) -> Retriever {
    let engine = KeywordEngine::new(&dir.path().join("rag"), 500, 50).unwrap();
    Retriever::from_engine(Arc::new(engine))
}

#[test]
fn extracts_per_page_text_and_counts_pages() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(
        &dir,
        "report.pdf",
        &["First page text", "", "Third page text"],
    );

    let document = PdfExtractor::extract(&path).unwrap();

    // The empty middle page counts toward page_count but contributes nothing.
    assert_eq!(document.page_count, 3);
    assert_eq!(document.pages.len(), 2);
    assert_eq!(document.pages[0].page, 1);
    assert_eq!(document.pages[1].page, 3);
    assert!(document.full_text.contains("First page text"));
    assert!(document.full_text.contains("\n\n"));
    assert_eq!(document.document_id(), "report");
}

#[test]
fn extract_missing_file_is_not_found() {
    let err = PdfExtractor::extract(std::path::Path::new("/no/such/file.pdf")).unwrap_err();
    assert!(matches!(err, ExtractError::NotFound(_)));
}

// Scenario: a 3-page PDF yielding ~1200 characters of text with the fixed
// 500/50 chunking defaults produces 3 chunks.
#[tokio::test]
async fn three_page_document_yields_three_chunks() {
    let dir = TempDir::new().unwrap();
    let pages = [filler(400), filler(400), filler(400)];
    let path = write_pdf(
        &dir,
        "paper.pdf",
        &pages.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    );

    let retriever = keyword_retriever(&dir);
    let outcome = retriever.index(&path).await.unwrap();

    assert_eq!(outcome.file_name, "paper.pdf");
    assert_eq!(outcome.page_count, 3);
    assert_eq!(outcome.num_chunks, 3);
}

// Scenario: a question matching exactly one chunk in one document returns a
// single attributed source with a positive score.
#[tokio::test]
async fn capital_of_france_matches_one_source() {
    let dir = TempDir::new().unwrap();
    let geo = write_pdf(&dir, "geo.pdf", &["Paris is the capital of France."]);
    let fruit = write_pdf(&dir, "fruit.pdf", &["Bananas are yellow."]);

    let retriever = keyword_retriever(&dir);
    retriever.index(&geo).await.unwrap();
    retriever.index(&fruit).await.unwrap();

    let result = retriever
        .query("What is the capital of France?", 5)
        .await
        .unwrap();

    assert!(result.has_results);
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].file, "geo.pdf");
    assert_eq!(result.num_results, 1);
    assert!(result.context.contains("(Source: geo.pdf, Chunk: 0)"));
    assert!(result.chunks[0].contains("Paris"));
}

// Scenario: k larger than the number of matching chunks is not padded.
#[tokio::test]
async fn top_k_returns_only_matching_chunks() {
    let dir = TempDir::new().unwrap();
    // Unique keyword at the start of the first two pages only; page-break
    // snapping keeps each page's opening inside its own chunk.
    let page1 = format!("quantum flux {}", filler(380));
    let page2 = format!("quantum drift {}", filler(380));
    let page3 = filler(400);
    let path = write_pdf(&dir, "physics.pdf", &[&page1, &page2, &page3]);

    let retriever = keyword_retriever(&dir);
    let outcome = retriever.index(&path).await.unwrap();
    assert_eq!(outcome.num_chunks, 3);

    let result = retriever.query("quantum", 5).await.unwrap();

    assert!(result.has_results);
    assert_eq!(result.num_results, 2);
    assert_eq!(result.chunks.len(), 2);
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].chunks, 2);
}

// Querying an engine with nothing indexed is a normal, non-error outcome.
#[tokio::test]
async fn empty_index_has_no_results() {
    let dir = TempDir::new().unwrap();
    let retriever = keyword_retriever(&dir);

    let result = retriever.query("anything at all", 5).await.unwrap();

    assert!(!result.has_results);
    assert!(result.sources.is_empty());
    assert!(result.chunks.is_empty());
    assert!(result.context.is_empty());
}

// Indexing, then reloading a fresh engine from the same persisted store,
// yields the same document listing.
#[tokio::test]
async fn listing_survives_engine_reload() {
    let dir = TempDir::new().unwrap();
    let pages = [filler(400), filler(400), filler(400)];
    let path = write_pdf(
        &dir,
        "paper.pdf",
        &pages.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    );

    let before = {
        let retriever = keyword_retriever(&dir);
        retriever.index(&path).await.unwrap();
        retriever.list().await.unwrap()
    };

    let reloaded = keyword_retriever(&dir);
    let after = reloaded.list().await.unwrap();

    assert_eq!(before, after);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].file_name, "paper.pdf");
    assert_eq!(after[0].pages, 3);
    assert_eq!(after[0].chunks, 3);
}

// Re-indexing the same document replaces its entry wholesale.
#[tokio::test]
async fn reindexing_replaces_prior_entry() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "notes.pdf", &["Old content about topology."]);

    let retriever = keyword_retriever(&dir);
    retriever.index(&path).await.unwrap();

    std::fs::write(&path, build_pdf(&["New content about geometry."])).unwrap();
    retriever.index(&path).await.unwrap();

    let docs = retriever.list().await.unwrap();
    assert_eq!(docs.len(), 1);

    let stale = retriever.query("topology", 5).await.unwrap();
    assert!(!stale.has_results);
    let fresh = retriever.query("geometry", 5).await.unwrap();
    assert!(fresh.has_results);
}

// Clearing the index is durable across reloads.
#[tokio::test]
async fn clear_is_durable() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "notes.pdf", &["Some indexed content here."]);

    let retriever = keyword_retriever(&dir);
    retriever.index(&path).await.unwrap();
    retriever.clear().await.unwrap();

    let reloaded = keyword_retriever(&dir);
    assert!(reloaded.list().await.unwrap().is_empty());
}
