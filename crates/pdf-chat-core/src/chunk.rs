//! Newline-boundary text chunker with overlap.
//!
//! Splits the concatenated document text into [`Chunk`]s of at most
//! `chunk_size` characters, where each chunk repeats up to `chunk_overlap`
//! characters of the tail of its predecessor. Splitting happens at `\n`
//! boundaries whenever possible.
//!
//! # Algorithm
//!
//! 1. Cut the text before every `\n`; the newline stays at the start of the
//!    following piece, so the pieces concatenate back to the input.
//! 2. Hard-split any piece longer than `chunk_size` at the last whitespace
//!    before the limit (or exactly at the limit if there is none).
//! 3. Greedily merge pieces into a window. When the next piece would push the
//!    window past `chunk_size`, flush the window as a chunk, then drop pieces
//!    from its front until at most `chunk_overlap` characters remain and the
//!    next piece fits.
//! 4. Flushed windows are whitespace-trimmed; blank windows are skipped.
//!
//! Lengths are counted in characters, not bytes, so multi-byte text never
//! splits inside a code point.
//!
//! # Example
//!
//! ```rust
//! use pdf_chat_core::chunk::{chunk_text, ChunkParams};
//!
//! let chunks = chunk_text("doc-1", "Hello world.\nSecond line.", &ChunkParams::default());
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].text, "Hello world.\nSecond line.");
//! ```

use std::collections::VecDeque;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Chunk;

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between neighbouring chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

const SEPARATOR: char = '\n';

/// Chunk sizing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Split `text` into overlapping chunks.
///
/// # Guarantees
///
/// - Every chunk is a substring of `text` and at most `chunk_size` characters.
/// - Chunk indices are contiguous: `0, 1, 2, …, N-1`.
/// - Blank or empty input yields no chunks at all.
pub fn chunk_text(document_id: &str, text: &str, params: &ChunkParams) -> Vec<Chunk> {
    let chunk_size = params.chunk_size.max(1);
    let overlap = params.chunk_overlap;

    let pieces: Vec<&str> = split_at_newlines(text)
        .into_iter()
        .flat_map(|piece| hard_split(piece, chunk_size))
        .collect();

    let mut chunks = Vec::new();
    let mut window: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = piece.chars().count();

        if total + len > chunk_size && !window.is_empty() {
            flush(&mut chunks, document_id, &window);
            while total > overlap || (total + len > chunk_size && total > 0) {
                match window.pop_front() {
                    Some((_, dropped)) => total -= dropped,
                    None => break,
                }
            }
        }

        window.push_back((piece, len));
        total += len;
    }

    if !window.is_empty() {
        flush(&mut chunks, document_id, &window);
    }

    chunks
}

/// Cut before every newline, keeping the newline with the following piece.
fn split_at_newlines(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == SEPARATOR && i > start {
            pieces.push(&text[start..i]);
            start = i;
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Split a piece longer than `max_chars` at whitespace (or at the limit).
fn hard_split(piece: &str, max_chars: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = piece;
    while rest.chars().count() > max_chars {
        let limit = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let cut = rest[..limit]
            .rfind(char::is_whitespace)
            .filter(|&pos| pos > 0)
            .unwrap_or(limit);
        out.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        out.push(rest);
    }
    out
}

fn flush(chunks: &mut Vec<Chunk>, document_id: &str, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return;
    }
    let index = chunks.len() as i64;
    chunks.push(make_chunk(document_id, index, trimmed));
}

/// Create a single [`Chunk`] with a UUID and SHA-256 content hash.
fn make_chunk(document_id: &str, index: i64, text: &str) -> Chunk {
    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        chunk_index: index,
        text: text.to_string(),
        hash: content_hash(text),
    }
}

/// Hex SHA-256 of a chunk's text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(chunk_size: usize, chunk_overlap: usize) -> ChunkParams {
        ChunkParams {
            chunk_size,
            chunk_overlap,
        }
    }

    fn numbered_lines(n: usize) -> String {
        (0..n)
            .map(|i| format!("line {:03} of the manual", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("doc1", "Hello, world!", &ChunkParams::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].text, "Hello, world!");
    }

    #[test]
    fn test_empty_and_blank_text() {
        assert!(chunk_text("doc1", "", &ChunkParams::default()).is_empty());
        assert!(chunk_text("doc1", "  \n\n \n", &ChunkParams::default()).is_empty());
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let text = numbered_lines(300);
        let chunks = chunk_text("doc1", &text, &params(100, 40));
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= 100, "chunk too long: {}", c.text);
        }
    }

    #[test]
    fn test_chunks_are_substrings() {
        let text = numbered_lines(120);
        for c in chunk_text("doc1", &text, &params(80, 20)) {
            assert!(text.contains(&c.text));
        }
    }

    #[test]
    fn test_neighbours_overlap() {
        let text = numbered_lines(200);
        let chunks = chunk_text("doc1", &text, &params(100, 40));
        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            let first_line = pair[1].text.lines().next().unwrap();
            assert!(
                pair[0].text.contains(first_line),
                "'{}' not carried over from previous chunk",
                first_line
            );
        }
    }

    #[test]
    fn test_zero_overlap_does_not_repeat() {
        let text = numbered_lines(50);
        let chunks = chunk_text("doc1", &text, &params(100, 0));
        let total_lines: usize = chunks.iter().map(|c| c.text.lines().count()).sum();
        assert_eq!(total_lines, 50);
    }

    #[test]
    fn test_default_params_on_long_text() {
        let text = numbered_lines(400);
        let chunks = chunk_text("doc1", &text, &ChunkParams::default());
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= DEFAULT_CHUNK_SIZE);
        }
    }

    #[test]
    fn test_long_line_hard_split_at_whitespace() {
        let text = "word ".repeat(100);
        let chunks = chunk_text("doc1", &text, &params(42, 0));
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= 42);
            assert!(!c.text.contains("wo rd"));
            assert!(c.text.split_whitespace().all(|w| w == "word"));
        }
    }

    #[test]
    fn test_long_line_without_whitespace() {
        let text = "x".repeat(250);
        let chunks = chunk_text("doc1", &text, &params(100, 0));
        let lens: Vec<usize> = chunks.iter().map(|c| c.text.len()).collect();
        assert_eq!(lens, vec![100, 100, 50]);
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let text = numbered_lines(150);
        let chunks = chunk_text("doc1", &text, &params(60, 10));
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64, "Index mismatch at position {}", i);
        }
    }

    #[test]
    fn test_multibyte_utf8_chars() {
        let text = "┌──────────────────┐\n│ Привет мир       │\n└──────────────────┘";
        let chunks = chunk_text("doc1", text, &params(7, 2));
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.text.chars().count() <= 7);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = numbered_lines(40);
        let c1 = chunk_text("doc1", &text, &params(50, 10));
        let c2 = chunk_text("doc1", &text, &params(50, 10));
        assert_eq!(c1.len(), c2.len());
        for (a, b) in c1.iter().zip(c2.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.hash, b.hash);
            assert_eq!(a.chunk_index, b.chunk_index);
        }
    }
}
