//! matchpoint: hybrid retrieval and ranking over a private resume corpus.
//!
//! Pipeline: resume exports are segmented into per-person documents
//! ([`ingest`]), stored durably ([`storage`]), chunked and indexed into
//! parallel dense and sparse indices, and queried through Reciprocal Rank
//! Fusion ([`search`]) with optional LLM-backed candidate scoring ([`llm`]).
//! [`engine::MatchEngine`] is the single owned facade over all of it.

pub mod cli;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod llm;
pub mod model;
pub mod search;
pub mod storage;

use tracing_subscriber::EnvFilter;

/// Initialize global tracing from `RUST_LOG` (default `warn`, crate `info`).
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,matchpoint=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
