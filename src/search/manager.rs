//! Lifecycle of the index set: build, atomic persist, load.
//!
//! The dense index, the BM25 index, and the chunk store share one sequential
//! id space and are only ever replaced together. Persistence writes two
//! artifacts into the index directory:
//!
//! - `dense.idx`: the dense vector index, MessagePack-encoded
//! - `metadata.msgpack`: chunk store + BM25 statistics + build metadata
//!
//! Each artifact is written to a temp file in the same directory and renamed
//! into place, and both writes complete before the in-memory swap, so a crash
//! mid-rebuild leaves the previous generation intact on disk and in memory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::model::ChunkRecord;

use super::dense::DenseIndex;
use super::embedder::{Embedder, l2_normalize};
use super::sparse::{Bm25Index, tokenize};
use super::{IndexError, SearchError};

pub const DENSE_ARTIFACT: &str = "dense.idx";
pub const META_ARTIFACT: &str = "metadata.msgpack";

/// One coherent generation of indices. Chunk id `i` addresses row `i` of the
/// dense index, document `i` of the BM25 index, and `chunks[i]`.
#[derive(Debug, Clone)]
pub struct IndexSet {
    pub chunks: Vec<ChunkRecord>,
    pub dense: DenseIndex,
    pub sparse: Bm25Index,
}

impl IndexSet {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Everything except the dense vectors, bundled into one artifact so the
/// chunk store and sparse statistics can never drift apart on disk.
#[derive(Debug, Serialize, Deserialize)]
struct MetadataBundle {
    embedder_id: String,
    dimension: usize,
    built_at: DateTime<Utc>,
    chunks: Vec<ChunkRecord>,
    sparse: Bm25Index,
}

/// Owns the active [`IndexSet`] and its on-disk artifacts.
pub struct IndexManager {
    index_dir: PathBuf,
    embedder: Arc<dyn Embedder>,
    active: Option<IndexSet>,
    built_at: Option<DateTime<Utc>>,
}

impl IndexManager {
    pub fn new(index_dir: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index_dir: index_dir.into(),
            embedder,
            active: None,
            built_at: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.active.is_some()
    }

    pub fn chunk_count(&self) -> usize {
        self.active.as_ref().map_or(0, IndexSet::len)
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// The active index set, or [`SearchError::NotReady`] when no generation
    /// has been built or loaded yet.
    pub fn active(&self) -> Result<&IndexSet, SearchError> {
        self.active.as_ref().ok_or(SearchError::NotReady)
    }

    /// Build a fresh generation from `chunks`, persist it, and swap it in.
    ///
    /// An empty chunk list is a no-op that leaves the current generation
    /// untouched; rebuilding over an accidentally empty corpus must never
    /// wipe a working index.
    pub fn build(&mut self, chunks: Vec<ChunkRecord>) -> Result<(), IndexError> {
        if chunks.is_empty() {
            warn!("no chunks to index; keeping existing index generation");
            return Ok(());
        }

        let dimension = self.embedder.dimension();
        let mut vectors = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let mut v = self.embedder.embed(&chunk.enriched_text);
            l2_normalize(&mut v);
            vectors.push(v);
        }
        let dense = DenseIndex::build(self.embedder.id(), dimension, &vectors)?;

        let corpus: Vec<Vec<String>> = chunks.iter().map(|c| tokenize(&c.enriched_text)).collect();
        let sparse = Bm25Index::build(&corpus);

        let built_at = Utc::now();
        self.persist(&dense, &chunks, &sparse, built_at)?;

        info!(chunks = chunks.len(), dimension, "index generation built and persisted");
        self.active = Some(IndexSet { chunks, dense, sparse });
        self.built_at = Some(built_at);
        Ok(())
    }

    fn persist(
        &self,
        dense: &DenseIndex,
        chunks: &[ChunkRecord],
        sparse: &Bm25Index,
        built_at: DateTime<Utc>,
    ) -> Result<(), IndexError> {
        fs::create_dir_all(&self.index_dir).map_err(|source| IndexError::CreateDir {
            path: self.index_dir.clone(),
            source,
        })?;

        let meta = MetadataBundle {
            embedder_id: self.embedder.id().to_string(),
            dimension: self.embedder.dimension(),
            built_at,
            chunks: chunks.to_vec(),
            sparse: sparse.clone(),
        };

        write_atomic(&self.index_dir, DENSE_ARTIFACT, &rmp_serde::to_vec_named(dense)?)?;
        write_atomic(&self.index_dir, META_ARTIFACT, &rmp_serde::to_vec_named(&meta)?)?;
        Ok(())
    }

    /// Try to restore the last persisted generation.
    ///
    /// Returns `false` (leaving the manager not-ready) when either artifact
    /// is missing, undecodable, or inconsistent with the other or with the
    /// configured embedder. A stale or half-written index must never load as
    /// if it were valid.
    pub fn load(&mut self) -> bool {
        let dense_path = self.index_dir.join(DENSE_ARTIFACT);
        let meta_path = self.index_dir.join(META_ARTIFACT);

        let Ok(dense_bytes) = fs::read(&dense_path) else {
            debug!(path = %dense_path.display(), "no dense artifact to load");
            return false;
        };
        let Ok(meta_bytes) = fs::read(&meta_path) else {
            debug!(path = %meta_path.display(), "no metadata artifact to load");
            return false;
        };

        let dense: DenseIndex = match rmp_serde::from_slice(&dense_bytes) {
            Ok(d) => d,
            Err(err) => {
                warn!(%err, "dense artifact is corrupt; ignoring persisted index");
                return false;
            }
        };
        let meta: MetadataBundle = match rmp_serde::from_slice(&meta_bytes) {
            Ok(m) => m,
            Err(err) => {
                warn!(%err, "metadata artifact is corrupt; ignoring persisted index");
                return false;
            }
        };

        if meta.embedder_id != self.embedder.id() || dense.embedder_id() != self.embedder.id() {
            warn!(
                persisted = %meta.embedder_id,
                configured = %self.embedder.id(),
                "persisted index was built with a different embedder; rebuild required"
            );
            return false;
        }
        if meta.dimension != self.embedder.dimension() || dense.dimension() != meta.dimension {
            warn!("persisted index dimension does not match configured embedder; rebuild required");
            return false;
        }
        if dense.len() != meta.chunks.len() || meta.sparse.len() != meta.chunks.len() {
            warn!(
                dense = dense.len(),
                sparse = meta.sparse.len(),
                chunks = meta.chunks.len(),
                "persisted artifacts disagree on corpus size; rebuild required"
            );
            return false;
        }

        info!(chunks = meta.chunks.len(), built_at = %meta.built_at, "index generation loaded");
        self.active = Some(IndexSet {
            chunks: meta.chunks,
            dense,
            sparse: meta.sparse,
        });
        self.built_at = Some(meta.built_at);
        true
    }
}

/// Write `bytes` to `dir/name` via a same-directory temp file and rename.
fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), IndexError> {
    use std::io::Write;

    let path = dir.join(name);
    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| IndexError::Write {
        path: path.clone(),
        source,
    })?;
    tmp.write_all(bytes).map_err(|source| IndexError::Write {
        path: path.clone(),
        source,
    })?;
    tmp.persist(&path).map_err(|err| IndexError::Write {
        path,
        source: err.error,
    })?;
    Ok(())
}
