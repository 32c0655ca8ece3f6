//! Reciprocal Rank Fusion over the dense and sparse retrieval legs.
//!
//! Each leg retrieves an oversampled pool of `search_k` chunk ids; a chunk at
//! 0-based rank `r` in a leg contributes `1 / (rrf_k + r + 1)` and the
//! contributions sum across legs. Rank positions, not raw scores, drive the
//! fusion, so cosine similarities and BM25 scores never need calibrating
//! against each other. Role filtering happens per candidate after fusion: the
//! first chunk seen for a person decides admit or reject for that whole
//! person within the query.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::model::ChunkHit;

use super::embedder::{Embedder, l2_normalize};
use super::manager::IndexSet;
use super::sparse::tokenize;

pub const DEFAULT_TOP_K: usize = 40;
pub const DEFAULT_RRF_K: usize = 60;

/// Minimum per-leg pool size; small corpora are scanned in full.
const MIN_SEARCH_K: usize = 120;

/// Query-time knobs for one search call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of fused hits to return.
    pub top_k: usize,
    /// RRF smoothing constant; larger values flatten the rank curve.
    pub rrf_k: usize,
    /// Case-insensitive role substrings; a candidate passes when any one of
    /// them occurs in their role. Empty means no filtering.
    pub target_roles: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            rrf_k: DEFAULT_RRF_K,
            target_roles: Vec::new(),
        }
    }
}

/// Per-leg pool size: oversample well past `top_k` so post-fusion role
/// filtering still has enough admitted candidates to fill the result list.
fn search_k(corpus_size: usize, top_k: usize) -> usize {
    corpus_size.min((top_k * 3).max(MIN_SEARCH_K))
}

/// Run both retrieval legs against `set`, fuse with RRF, apply the role
/// filter, and return at most `opts.top_k` hits in descending fused score.
pub fn hybrid_search(
    set: &IndexSet,
    embedder: &dyn Embedder,
    query: &str,
    opts: &SearchOptions,
) -> Vec<ChunkHit> {
    let k = search_k(set.len(), opts.top_k);

    let mut query_vec = embedder.embed(query);
    l2_normalize(&mut query_vec);
    let dense_pool = set.dense.search(&query_vec, k);
    let sparse_pool = set.sparse.top_k(&tokenize(query), k);

    // First-seen insertion order (dense leg first) is the tie order for
    // equal fused scores, kept stable by the final sort.
    let mut fused: FxHashMap<u32, f64> = FxHashMap::default();
    let mut order: Vec<u32> = Vec::with_capacity(dense_pool.len() + sparse_pool.len());
    for pool in [&dense_pool, &sparse_pool] {
        for (rank, (chunk_id, _)) in pool.iter().enumerate() {
            let contribution = 1.0 / (opts.rrf_k + rank + 1) as f64;
            match fused.entry(*chunk_id) {
                std::collections::hash_map::Entry::Occupied(mut e) => *e.get_mut() += contribution,
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(contribution);
                    order.push(*chunk_id);
                }
            }
        }
    }

    let mut ranked: Vec<(u32, f64)> = order
        .into_iter()
        .map(|id| (id, fused[&id]))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    debug!(
        dense = dense_pool.len(),
        sparse = sparse_pool.len(),
        fused = ranked.len(),
        "fused retrieval pools"
    );

    let mut admitted: FxHashSet<&str> = FxHashSet::default();
    let mut rejected: FxHashSet<&str> = FxHashSet::default();
    let mut hits = Vec::with_capacity(opts.top_k);

    for (chunk_id, score) in ranked {
        if hits.len() >= opts.top_k {
            break;
        }
        let chunk = &set.chunks[chunk_id as usize];
        let owner = chunk.owner_name.as_str();
        if !rejected.contains(owner) && !admitted.contains(owner) {
            if role_matches(&chunk.owner_role, &opts.target_roles) {
                admitted.insert(owner);
            } else {
                rejected.insert(owner);
            }
        }
        if rejected.contains(owner) {
            continue;
        }
        hits.push(ChunkHit {
            chunk_id,
            owner_name: chunk.owner_name.clone(),
            owner_role: chunk.owner_role.clone(),
            text: chunk.display_text().to_string(),
            score,
        });
    }
    hits
}

/// Case-insensitive substring match against any target role. A candidate
/// with no recorded role cannot demonstrate a match, so an active filter
/// rejects them.
fn role_matches(owner_role: &str, targets: &[String]) -> bool {
    if targets.is_empty() {
        return true;
    }
    let role = owner_role.to_lowercase();
    if role.is_empty() {
        return false;
    }
    targets.iter().any(|t| role.contains(&t.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChunkRecord;
    use crate::search::embedder::HashEmbedder;
    use crate::search::manager::IndexManager;
    use std::sync::Arc;

    fn chunk(owner: &str, role: &str, body: &str) -> ChunkRecord {
        ChunkRecord {
            owner_name: owner.to_string(),
            owner_role: role.to_string(),
            enriched_text: format!("Candidate: {owner} | Role: {role}\n{body}"),
            raw_text: None,
        }
    }

    fn build_set(chunks: Vec<ChunkRecord>) -> (IndexSet, Arc<HashEmbedder>) {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(HashEmbedder::default());
        let mut mgr = IndexManager::new(dir.path(), embedder.clone());
        mgr.build(chunks).unwrap();
        (mgr.active().unwrap().clone(), embedder)
    }

    #[test]
    fn search_k_oversamples_but_never_exceeds_corpus() {
        assert_eq!(search_k(10, 40), 10);
        assert_eq!(search_k(1000, 40), 120);
        assert_eq!(search_k(1000, 50), 150);
    }

    #[test]
    fn chunk_in_both_legs_outranks_single_leg_peers() {
        // "rust systems" hits chunk 0 in both legs; fillers only appear via
        // one leg or rank lower in both.
        let (set, embedder) = build_set(vec![
            chunk("Alice", "Systems Engineer", "rust systems programming daily"),
            chunk("Bob", "Project Manager", "stakeholder workshops and budgets"),
            chunk("Cara", "Designer", "brand identity and typography"),
        ]);
        let hits = hybrid_search(&set, embedder.as_ref(), "rust systems", &SearchOptions::default());
        assert!(!hits.is_empty());
        assert_eq!(hits[0].owner_name, "Alice");
        assert!(hits[0].score > hits[1].score);
        // Rank 0 in both legs: 1/61 + 1/61.
        assert!((hits[0].score - 2.0 / 61.0).abs() < 1e-12);
    }

    #[test]
    fn rrf_scores_are_bounded_by_leg_count() {
        let (set, embedder) = build_set(vec![
            chunk("Alice", "Engineer", "rust"),
            chunk("Bob", "Engineer", "python"),
        ]);
        let opts = SearchOptions::default();
        for hit in hybrid_search(&set, embedder.as_ref(), "rust python", &opts) {
            assert!(hit.score > 0.0);
            assert!(hit.score <= 2.0 / (opts.rrf_k as f64 + 1.0));
        }
    }

    #[test]
    fn result_list_never_exceeds_top_k() {
        let chunks: Vec<ChunkRecord> = (0..30)
            .map(|i| chunk(&format!("Person {i}"), "Engineer", &format!("skill number {i}")))
            .collect();
        let (set, embedder) = build_set(chunks);
        let opts = SearchOptions { top_k: 5, ..SearchOptions::default() };
        assert!(hybrid_search(&set, embedder.as_ref(), "skill number", &opts).len() <= 5);
    }

    #[test]
    fn role_filter_is_case_insensitive_substring() {
        let (set, embedder) = build_set(vec![
            chunk("Alice", "Senior NLP Engineer", "transformer fine tuning"),
            chunk("Bob", "Accountant", "transformer fine tuning"),
        ]);
        let opts = SearchOptions {
            target_roles: vec!["nlp engineer".to_string()],
            ..SearchOptions::default()
        };
        let hits = hybrid_search(&set, embedder.as_ref(), "transformer fine tuning", &opts);
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.owner_name == "Alice"));
    }

    #[test]
    fn missing_role_is_rejected_by_an_active_filter() {
        let (set, embedder) = build_set(vec![
            chunk("Alice", "", "transformer fine tuning"),
            chunk("Bob", "NLP Engineer", "transformer fine tuning"),
        ]);
        let opts = SearchOptions {
            target_roles: vec!["engineer".to_string()],
            ..SearchOptions::default()
        };
        let hits = hybrid_search(&set, embedder.as_ref(), "transformer fine tuning", &opts);
        assert!(hits.iter().all(|h| h.owner_name == "Bob"));
    }

    #[test]
    fn empty_filter_admits_everyone() {
        let (set, embedder) = build_set(vec![
            chunk("Alice", "", "rust work"),
            chunk("Bob", "Engineer", "rust work"),
        ]);
        let hits = hybrid_search(&set, embedder.as_ref(), "rust work", &SearchOptions::default());
        let owners: FxHashSet<&str> = hits.iter().map(|h| h.owner_name.as_str()).collect();
        assert!(owners.contains("Alice") && owners.contains("Bob"));
    }

    #[test]
    fn filter_verdict_is_consistent_across_a_candidates_chunks() {
        let (set, embedder) = build_set(vec![
            chunk("Alice", "NLP Engineer", "entity recognition models"),
            chunk("Alice", "NLP Engineer", "entity linking pipelines"),
            chunk("Bob", "Chef", "entity recognition models"),
        ]);
        let opts = SearchOptions {
            target_roles: vec!["nlp".to_string()],
            ..SearchOptions::default()
        };
        let hits = hybrid_search(&set, embedder.as_ref(), "entity recognition", &opts);
        assert!(hits.len() >= 2);
        assert!(hits.iter().all(|h| h.owner_name == "Alice"));
    }
}
