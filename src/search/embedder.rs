//! Embedding backends for the dense retrieval leg.
//!
//! The default backend is FNV-1a feature hashing: fully deterministic, no
//! model download, stable across runs and platforms. Anything implementing
//! [`Embedder`] can be swapped in, but corpus and query must always go
//! through the same instance; the index records the embedder id and refuses
//! to load under a different one.

/// A text-to-vector encoder. Implementations return raw (unnormalized)
/// vectors; callers normalize with [`l2_normalize`] so corpus and query
/// vectors are treated identically.
pub trait Embedder: Send + Sync {
    /// Stable identifier persisted alongside the index (e.g. `fnv1a-384`).
    fn id(&self) -> &str;
    /// Output dimension; constant for the lifetime of the instance.
    fn dimension(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

pub const DEFAULT_DIMENSION: usize = 384;

/// FNV-1a feature-hash embedder.
///
/// Each lowercase whitespace token hashes to one bucket; the hash's top bit
/// picks the sign so collisions partially cancel instead of compounding.
/// Adjacent-token bigrams are hashed too, giving the vector some phrase
/// sensitivity beyond bag-of-words.
pub struct HashEmbedder {
    id: String,
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            id: format!("fnv1a-{dimension}"),
            dimension,
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        for token in &tokens {
            accumulate(&mut v, fnv1a(token.as_bytes()));
        }
        for pair in tokens.windows(2) {
            let mut h = fnv1a(pair[0].as_bytes());
            h ^= fnv1a(pair[1].as_bytes()).rotate_left(17);
            accumulate(&mut v, h);
        }
        v
    }
}

fn accumulate(v: &mut [f32], hash: u64) {
    let idx = (hash % v.len() as u64) as usize;
    let sign = if hash & (1 << 63) != 0 { -1.0 } else { 1.0 };
    v[idx] += sign;
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Scale a vector to unit length in place. All-zero vectors (e.g. from empty
/// text) are left untouched so they score zero against everything.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
