//! The match engine: one owned facade over chunking, indexing, and search.
//!
//! Writers (rebuild) take the write lock; searches share the read lock.
//! The lock wraps the whole [`IndexManager`] so a search can never observe
//! a half-swapped index generation.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::ingest::deck::{has_position_tags, strip_position_tags};
use crate::model::{CandidateRecord, ChunkHit, ChunkRecord};
use crate::search::fusion::{SearchOptions, hybrid_search};
use crate::search::manager::IndexManager;
use crate::search::{Embedder, HashEmbedder, IndexError, SearchError};
use crate::storage::{CandidateStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Point-in-time snapshot of engine state, serializable for status output.
#[derive(Debug, Serialize)]
pub struct EngineStats {
    pub ready: bool,
    pub chunk_count: usize,
    pub embedder_id: String,
    pub built_at: Option<DateTime<Utc>>,
}

pub struct MatchEngine {
    embedder: Arc<dyn Embedder>,
    index: RwLock<IndexManager>,
}

impl MatchEngine {
    /// Create an engine over `index_dir` with the default hash embedder.
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        Self {
            index: RwLock::new(IndexManager::new(index_dir, embedder.clone())),
            embedder,
        }
    }

    /// Try to restore persisted indices; `false` leaves the engine not-ready.
    pub fn load(&self) -> bool {
        self.index.write().load()
    }

    pub fn is_ready(&self) -> bool {
        self.index.read().is_ready()
    }

    pub fn stats(&self) -> EngineStats {
        let index = self.index.read();
        EngineStats {
            ready: index.is_ready(),
            chunk_count: index.chunk_count(),
            embedder_id: self.embedder.id().to_string(),
            built_at: index.built_at(),
        }
    }

    /// Re-chunk every stored candidate and build a fresh index generation.
    /// Returns the number of chunks indexed.
    pub fn rebuild(&self, store: &CandidateStore) -> Result<usize, EngineError> {
        let candidates = store.all()?;
        let chunks = chunks_from_candidates(&candidates);
        let count = chunks.len();
        info!(candidates = candidates.len(), chunks = count, "rebuilding indices");
        self.index.write().build(chunks)?;
        Ok(count)
    }

    /// Hybrid search over the active index generation.
    pub fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<ChunkHit>, SearchError> {
        let index = self.index.read();
        let set = index.active()?;
        Ok(hybrid_search(set, self.embedder.as_ref(), query, opts))
    }
}

/// Chunk candidates into indexable records: one chunk per blank-line block.
///
/// Positionally tagged blocks keep the tagged original as `raw_text` and
/// index the stripped body; every chunk's indexed text is prefixed with the
/// candidate header so retrieval context survives chunk isolation.
pub fn chunks_from_candidates(candidates: &[CandidateRecord]) -> Vec<ChunkRecord> {
    let mut chunks = Vec::new();
    for candidate in candidates {
        let role = candidate.role.clone().unwrap_or_default();
        let header_role = if role.is_empty() { "Unknown" } else { role.as_str() };
        for block in candidate.content.split("\n\n") {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }
            let (body, raw_text) = if has_position_tags(block) {
                (strip_position_tags(block), Some(block.to_string()))
            } else {
                (block.to_string(), None)
            };
            if body.is_empty() {
                continue;
            }
            chunks.push(ChunkRecord {
                owner_name: candidate.name.clone(),
                owner_role: role.clone(),
                enriched_text: format!(
                    "Candidate: {} | Role: {header_role}\n{body}",
                    candidate.name
                ),
                raw_text,
            });
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProfileMetadata;

    fn candidate(name: &str, role: Option<&str>, content: &str) -> CandidateRecord {
        CandidateRecord {
            id: None,
            filename: format!("{}.txt", name.to_lowercase()),
            name: name.to_string(),
            role: role.map(str::to_string),
            email: None,
            phone: None,
            content: content.to_string(),
        }
    }

    #[test]
    fn chunking_splits_on_blank_lines_and_enriches() {
        let chunks = chunks_from_candidates(&[candidate(
            "Alice",
            Some("NLP Lead"),
            "Led platform work\n\n\n\nShipped entity linking",
        )]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].enriched_text, "Candidate: Alice | Role: NLP Lead\nLed platform work");
        assert_eq!(chunks[1].enriched_text, "Candidate: Alice | Role: NLP Lead\nShipped entity linking");
        assert!(chunks[0].raw_text.is_none());
    }

    #[test]
    fn missing_role_reads_unknown_in_header_but_stays_empty_on_chunk() {
        let chunks = chunks_from_candidates(&[candidate("Alice", None, "Body text")]);
        assert_eq!(chunks[0].owner_role, "");
        assert!(chunks[0].enriched_text.starts_with("Candidate: Alice | Role: Unknown\n"));
    }

    #[test]
    fn tagged_blocks_keep_raw_and_index_stripped() {
        let chunks = chunks_from_candidates(&[candidate(
            "Alice",
            Some("Lead"),
            "<s1_p1>\nAlice Example\nSenior Lead\n</s1_p1>",
        )]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].raw_text.as_deref(), Some("<s1_p1>\nAlice Example\nSenior Lead\n</s1_p1>"));
        assert_eq!(chunks[0].enriched_text, "Candidate: Alice | Role: Lead\nAlice Example\nSenior Lead");
    }

    #[test]
    fn search_before_any_build_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MatchEngine::new(dir.path());
        assert!(!engine.load());
        assert!(matches!(
            engine.search("anything", &SearchOptions::default()),
            Err(SearchError::NotReady)
        ));
    }

    #[test]
    fn rebuild_then_search_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CandidateStore::open(dir.path().join("candidates.db")).unwrap();
        store
            .upsert(&CandidateRecord::from_parts(
                "alice.txt",
                ProfileMetadata {
                    name: "Alice".to_string(),
                    role: Some("NLP Lead".to_string()),
                    email: None,
                    phone: None,
                },
                "Built transformer pipelines\n\nLed a healthcare NLP team",
            ))
            .unwrap();

        let engine = MatchEngine::new(dir.path().join("index"));
        let indexed = engine.rebuild(&store).unwrap();
        assert_eq!(indexed, 2);

        let hits = engine
            .search("healthcare nlp", &SearchOptions::default())
            .unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].owner_name, "Alice");

        let stats = engine.stats();
        assert!(stats.ready);
        assert_eq!(stats.chunk_count, 2);
    }
}
