//! Normalized entity structs shared across ingestion, indexing, and search.

use serde::{Deserialize, Serialize};

/// One person's durable record in the candidate store.
///
/// `filename` is the upsert key: the original filename for single-person
/// documents, or a synthetic `stem_personN.ext` name when one file yielded
/// several people. `content` is the already-segmented, blank-line-delimited
/// resume text the indices are built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: Option<i64>,
    pub filename: String,
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub content: String,
}

impl CandidateRecord {
    /// Build a record from segmented content plus extracted profile metadata.
    pub fn from_parts(filename: impl Into<String>, meta: ProfileMetadata, content: impl Into<String>) -> Self {
        Self {
            id: None,
            filename: filename.into(),
            name: meta.name,
            role: meta.role,
            email: meta.email,
            phone: meta.phone,
            content: content.into(),
        }
    }
}

/// Identity fields inferred from a resume's opening section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ProfileMetadata {
    /// Safe fallback used when extraction fails; ingestion never aborts on it.
    pub fn unknown() -> Self {
        Self {
            name: "Unknown".to_string(),
            role: None,
            email: None,
            phone: None,
        }
    }
}

/// The atomic retrieval unit: one content block of one person's resume.
///
/// A chunk's id is its position in the build sequence; the dense index, the
/// BM25 index, and the chunk store all share that id space. `enriched_text`
/// carries the candidate context header so every chunk is self-contained;
/// `raw_text` preserves the positionally tagged source block when the input
/// format provides provenance coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub owner_name: String,
    pub owner_role: String,
    pub enriched_text: String,
    pub raw_text: Option<String>,
}

impl ChunkRecord {
    /// Text shown to downstream consumers: tagged source when available.
    pub fn display_text(&self) -> &str {
        self.raw_text.as_deref().unwrap_or(&self.enriched_text)
    }
}

/// One fused search result with full traceability back to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkHit {
    pub chunk_id: u32,
    pub owner_name: String,
    pub owner_role: String,
    pub text: String,
    pub score: f64,
}

/// Per-candidate verdict produced by the scoring collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateEvaluation {
    pub name: String,
    pub role: Option<String>,
    /// Fit score, clamped to 0..=100.
    pub score: u8,
    pub rationale: String,
    pub evidence: Vec<String>,
}
