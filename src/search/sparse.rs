//! Okapi BM25 over lowercase whitespace tokens.
//!
//! The whole term-statistics table serializes into the metadata artifact so
//! the sparse leg reloads in lockstep with the dense index and chunk store.
//! Scoring uses the Lucene idf variant `ln(1 + (N - df + 0.5)/(df + 0.5))`,
//! which stays positive for terms present in most documents instead of
//! needing a negative-idf correction pass.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_K1: f32 = 1.5;
pub const DEFAULT_B: f32 = 0.75;

/// Lowercase whitespace tokenization, applied identically to corpus
/// documents at build time and queries at search time.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Posting {
    doc: u32,
    tf: u32,
}

/// BM25 keyword-frequency index over the chunk corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Index {
    k1: f32,
    b: f32,
    doc_lengths: Vec<u32>,
    avg_doc_len: f32,
    postings: HashMap<String, Vec<Posting>>,
}

impl Bm25Index {
    /// Build from tokenized documents, one per chunk in id order.
    pub fn build(corpus: &[Vec<String>]) -> Self {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(corpus.len());

        for (doc, tokens) in corpus.iter().enumerate() {
            doc_lengths.push(tokens.len() as u32);
            let mut freqs: HashMap<&str, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token.as_str()).or_default() += 1;
            }
            for (term, tf) in freqs {
                postings
                    .entry(term.to_string())
                    .or_default()
                    .push(Posting { doc: doc as u32, tf });
            }
        }

        let avg_doc_len = if corpus.is_empty() {
            0.0
        } else {
            doc_lengths.iter().sum::<u32>() as f32 / corpus.len() as f32
        };

        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            doc_lengths,
            avg_doc_len,
            postings,
        }
    }

    /// Number of documents in the corpus.
    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    /// Score a tokenized query against every document in the corpus.
    /// Repeated query tokens contribute once per occurrence.
    pub fn score_all(&self, query_tokens: &[String]) -> Vec<f32> {
        let n = self.len() as f32;
        let mut scores = vec![0.0f32; self.len()];

        for token in query_tokens {
            let Some(postings) = self.postings.get(token) else {
                continue;
            };
            let df = postings.len() as f32;
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
            for posting in postings {
                let tf = posting.tf as f32;
                let dl = self.doc_lengths[posting.doc as usize] as f32;
                let norm = 1.0 - self.b + self.b * dl / self.avg_doc_len.max(f32::EPSILON);
                scores[posting.doc as usize] += idf * tf * (self.k1 + 1.0) / (tf + self.k1 * norm);
            }
        }
        scores
    }

    /// Top-`k` documents by score, descending; ties by ascending doc id.
    pub fn top_k(&self, query_tokens: &[String], k: usize) -> Vec<(u32, f32)> {
        let mut ranked: Vec<(u32, f32)> = self
            .score_all(query_tokens)
            .into_iter()
            .enumerate()
            .map(|(doc, score)| (doc as u32, score))
            .collect();
        ranked.sort_unstable_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(k);
        ranked
    }
}
