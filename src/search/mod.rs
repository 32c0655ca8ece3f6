//! Hybrid retrieval: dense + sparse indices fused with Reciprocal Rank Fusion.
//!
//! Layout mirrors the retrieval pipeline:
//! - [`embedder`]: text-to-vector encoding (deterministic feature hashing)
//! - [`dense`]: flat inner-product index over normalized embeddings
//! - [`sparse`]: Okapi BM25 over tokenized enriched text
//! - [`manager`]: build / atomic persist / load of both indices + chunk store
//! - [`fusion`]: query-time RRF fusion and candidate-level role filtering

pub mod dense;
pub mod embedder;
pub mod fusion;
pub mod manager;
pub mod sparse;

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, persisting, or loading the index set.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding for chunk {chunk_id} has dimension {actual}, index expects {expected}")]
    DimensionMismatch {
        chunk_id: u32,
        expected: usize,
        actual: usize,
    },

    #[error("failed to create index directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize index artifact: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to write index artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors surfaced to search callers. "Not ready" is deliberately distinct
/// from an empty result list: empty means "no matches", not-ready means "no
/// index has ever been built or loaded" and callers should trigger a rebuild.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search indices are not initialized; ingest candidates or rebuild first")]
    NotReady,
}

pub use dense::DenseIndex;
pub use embedder::{Embedder, HashEmbedder, l2_normalize};
pub use fusion::{SearchOptions, hybrid_search};
pub use manager::{IndexManager, IndexSet};
pub use sparse::{Bm25Index, tokenize};
