//! Flat inner-product vector index.
//!
//! Vectors are L2-normalized at build time, so inner product equals cosine
//! similarity without a per-query normalization step inside the index.
//! Retrieval is an exact scan: corpora here are thousands of chunks, where
//! brute force beats ANN bookkeeping and keeps recall perfect.

use serde::{Deserialize, Serialize};

use super::IndexError;
use super::embedder::dot;

/// Dense similarity index: one fixed-dimension row per chunk id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseIndex {
    embedder_id: String,
    dimension: usize,
    /// Row-major normalized vectors; row i belongs to chunk id i.
    data: Vec<f32>,
}

impl DenseIndex {
    /// Build from pre-normalized vectors, one per chunk in id order.
    pub fn build(
        embedder_id: impl Into<String>,
        dimension: usize,
        vectors: &[Vec<f32>],
    ) -> Result<Self, IndexError> {
        let mut data = Vec::with_capacity(dimension * vectors.len());
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    chunk_id: i as u32,
                    expected: dimension,
                    actual: v.len(),
                });
            }
            data.extend_from_slice(v);
        }
        Ok(Self {
            embedder_id: embedder_id.into(),
            dimension,
            data,
        })
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        if self.dimension == 0 { 0 } else { self.data.len() / self.dimension }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Top-`k` chunk ids by inner product, descending; ties by ascending id.
    /// Returns fewer than `k` entries when the corpus is smaller; short
    /// pools are never padded.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(u32, f32)> {
        let mut scored: Vec<(u32, f32)> = self
            .data
            .chunks_exact(self.dimension.max(1))
            .enumerate()
            .map(|(id, row)| (id as u32, dot(row, query)))
            .collect();
        scored.sort_unstable_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored
    }
}
