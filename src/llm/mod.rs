//! LLM collaboration: profile extraction at ingest time and candidate
//! scoring at query time.
//!
//! Both call the same JSON-mode chat-completions endpoint but fail very
//! differently. Extraction is best-effort: any error degrades to an
//! `Unknown` profile and ingestion continues. Scoring distinguishes a
//! malformed verdict for one candidate (skip them, keep going) from a
//! transport or HTTP failure (abort the evaluation, the next candidate
//! would fail the same way).

pub mod extract;
pub mod groq;

use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{CandidateEvaluation, ChunkHit};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("llm endpoint returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("llm response was not usable: {0}")]
    Malformed(String),
}

impl LlmError {
    /// Whether the same request could plausibly succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(_) => true,
            LlmError::Http { status, .. } => *status == 429 || *status >= 500,
            LlmError::Malformed(_) => false,
        }
    }
}

/// Scores one candidate's retrieved evidence against the recruiter's query.
pub trait CandidateScorer {
    fn score(
        &self,
        query: &str,
        name: &str,
        role: &str,
        evidence: &[String],
    ) -> Result<CandidateEvaluation, LlmError>;
}

/// Evidence for one candidate, grouped from fused hits in retrieval order.
#[derive(Debug, Clone)]
pub struct CandidateEvidence {
    pub name: String,
    pub role: String,
    pub chunks: Vec<String>,
}

/// Group fused hits per candidate, preserving the fused ranking of each
/// candidate's first appearance.
pub fn group_evidence(hits: &[ChunkHit]) -> Vec<CandidateEvidence> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut grouped: Vec<CandidateEvidence> = Vec::new();
    for hit in hits {
        if seen.insert(hit.owner_name.as_str()) {
            grouped.push(CandidateEvidence {
                name: hit.owner_name.clone(),
                role: hit.owner_role.clone(),
                chunks: Vec::new(),
            });
        }
        let entry = grouped
            .iter_mut()
            .find(|c| c.name == hit.owner_name)
            .expect("candidate was just inserted");
        entry.chunks.push(hit.text.clone());
    }
    grouped
}

/// Score every candidate appearing in `hits` and return verdicts sorted by
/// descending score.
///
/// A malformed verdict drops that one candidate with a warning; transport
/// and HTTP failures propagate immediately.
pub fn evaluate_candidates(
    scorer: &dyn CandidateScorer,
    query: &str,
    hits: &[ChunkHit],
) -> Result<Vec<CandidateEvaluation>, LlmError> {
    let mut evaluations = Vec::new();
    for candidate in group_evidence(hits) {
        match scorer.score(query, &candidate.name, &candidate.role, &candidate.chunks) {
            Ok(eval) => {
                debug!(name = %eval.name, score = eval.score, "candidate scored");
                evaluations.push(eval);
            }
            Err(LlmError::Malformed(reason)) => {
                warn!(name = %candidate.name, %reason, "skipping candidate with unusable verdict");
            }
            Err(err) => return Err(err),
        }
    }
    evaluations.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(evaluations)
}
