//! Property tests for fused retrieval output.
//!
//! Whatever corpus and query we throw at it, fused output must stay capped,
//! sorted, bounded by the two-leg RRF maximum, and consistent with an active
//! role filter.

use std::sync::Arc;

use matchpoint::model::ChunkRecord;
use matchpoint::search::fusion::{SearchOptions, hybrid_search};
use matchpoint::search::manager::IndexManager;
use matchpoint::search::HashEmbedder;
use proptest::prelude::*;

const VOCAB: &[&str] = &[
    "rust", "python", "kubernetes", "nlp", "transformer", "etl", "react",
    "terraform", "postgres", "healthcare", "fintech", "platform",
];

const ROLES: &[&str] = &["Engineer", "Data Scientist", "Designer", "Manager", ""];

fn words(range: std::ops::Range<usize>) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), range)
        .prop_map(|ws| ws.join(" "))
}

fn corpus() -> impl Strategy<Value = Vec<ChunkRecord>> {
    prop::collection::vec((0usize..6, words(1..8)), 1..20).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(owner, body)| {
                // Role is a function of the owner so every chunk of one
                // person carries the same role, as real ingestion produces.
                let name = format!("Person {owner}");
                let role = ROLES[owner % ROLES.len()];
                ChunkRecord {
                    owner_name: name.clone(),
                    owner_role: role.to_string(),
                    enriched_text: format!("Candidate: {name} | Role: {role}\n{body}"),
                    raw_text: None,
                }
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn fused_output_is_capped_sorted_and_bounded(
        chunks in corpus(),
        query in words(1..5),
        top_k in 1usize..10,
        filter_role in prop::option::of(prop::sample::select(&ROLES[..4])),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(HashEmbedder::default());
        let mut mgr = IndexManager::new(dir.path(), embedder.clone());
        mgr.build(chunks.clone()).unwrap();
        let set = mgr.active().unwrap();

        let opts = SearchOptions {
            top_k,
            target_roles: filter_role.iter().map(|r| r.to_string()).collect(),
            ..SearchOptions::default()
        };
        let hits = hybrid_search(set, embedder.as_ref(), &query, &opts);

        prop_assert!(hits.len() <= top_k);

        let max_score = 2.0 / (opts.rrf_k as f64 + 1.0);
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        for hit in &hits {
            prop_assert!(hit.score > 0.0 && hit.score <= max_score + 1e-12);
            prop_assert!((hit.chunk_id as usize) < chunks.len());
            if let Some(role) = &filter_role {
                let owner_role = chunks[hit.chunk_id as usize].owner_role.to_lowercase();
                prop_assert!(owner_role.contains(&role.to_lowercase()));
            }
        }
    }
}
