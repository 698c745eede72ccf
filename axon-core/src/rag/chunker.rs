//! Boundary-aware text chunking for retrieval.
//!
//! Splits extracted document text into overlapping segments, preferring to
//! cut at natural boundaries (paragraph breaks, sentence ends) near the end
//! of each window instead of mid-sentence. Chunk boundaries are fully
//! deterministic for fixed inputs, which indexing reproducibility and the
//! tests rely on.

/// Boundary delimiters in priority order: paragraph break, CJK full stop,
/// sentence punctuation, then plain newline.
const DELIMITERS: [&str; 6] = ["\n\n", "。", ".", "!", "?", "\n"];

/// How many characters at the end of a window are searched for a delimiter.
const BOUNDARY_SEARCH_CHARS: usize = 100;

/// Splits text into overlapping chunks of at most `chunk_size` characters.
///
/// `overlap` must be smaller than `chunk_size`. Window ends snap backward to
/// the nearest delimiter found within the trailing [`BOUNDARY_SEARCH_CHARS`]
/// characters; a window with no delimiter keeps its hard boundary. Every
/// produced chunk is trimmed and non-empty; slices that trim to nothing are
/// skipped. Sizes are measured in characters and all offsets stay on UTF-8
/// boundaries.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(chunk_size > 0, "chunk_size must be positive");
    debug_assert!(overlap < chunk_size, "overlap must be smaller than chunk_size");

    if text.is_empty() {
        return Vec::new();
    }

    let len = text.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < len {
        let mut end = offset_after_chars(text, start, chunk_size);

        if end < len {
            end = snap_to_boundary(text, start, end);
        }

        let chunk = text[start..end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= len {
            break;
        }

        // Step back by the overlap, but always make forward progress even
        // for degenerate boundary/overlap combinations.
        let next = offset_before_chars(text, end, overlap);
        start = if next > start { next } else { end };
    }

    chunks
}

/// Searches the trailing window for the highest-priority delimiter and
/// returns the boundary just after it, or the hard boundary if none matched
/// strictly inside the chunk.
fn snap_to_boundary(text: &str, start: usize, end: usize) -> usize {
    let search_start = offset_before_chars(text, end, BOUNDARY_SEARCH_CHARS).max(start);

    for delim in DELIMITERS {
        if let Some(pos) = text[search_start..end].rfind(delim) {
            let pos = search_start + pos;
            if pos > start {
                let first_char_len = delim.chars().next().map_or(1, char::len_utf8);
                return pos + first_char_len;
            }
        }
    }

    end
}

/// Byte offset `n` characters after `from` (clamped to the text length).
fn offset_after_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Byte offset `n` characters before `from` (clamped to zero).
fn offset_before_chars(text: &str, from: usize, n: usize) -> usize {
    let back: usize = text[..from]
        .chars()
        .rev()
        .take(n)
        .map(char::len_utf8)
        .sum();
    from - back
}
