//! In-memory vector index over chunk embeddings.
//!
//! Entries are keyed by chunk content hash, so identical chunk texts are
//! stored once. Search is brute-force cosine similarity over every entry,
//! which is adequate for the few hundred chunks a handful of PDFs produce.
//!
//! The index is built wholesale from one ingestion and never updated
//! incrementally; a new ingestion builds a new index.

use std::collections::HashSet;

use anyhow::{bail, Result};

use crate::embedding::cosine_similarity;
use crate::models::{Chunk, RetrievedChunk};

#[derive(Debug)]
struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Similarity index built from one set of embedded chunks.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build an index from chunks and their vectors (same order, same length).
    pub fn build(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            bail!(
                "cannot index {} chunks with {} vectors",
                chunks.len(),
                vectors.len()
            );
        }

        let mut seen = HashSet::new();
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .filter(|(chunk, _)| seen.insert(chunk.hash.clone()))
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `k` chunks most similar to `query_vec`, best first.
    ///
    /// Ties keep chunk order.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<RetrievedChunk> {
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query_vec, &entry.vector), entry))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, entry)| RetrievedChunk {
                chunk_index: entry.chunk.chunk_index,
                text: entry.chunk.text.clone(),
                score,
            })
            .collect()
    }
}
