//! Text embeddings for the chunk store.
//!
//! The store only depends on the `Embedder` trait. The default
//! `HashingEmbedder` is local and deterministic: lower-cased word tokens are
//! hashed into a fixed number of signed buckets and the vector is
//! L2-normalized, so cosine similarity reduces to a dot product.

use sha2::{Digest, Sha256};

pub const DEFAULT_DIMENSIONS: usize = 384;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "our", "the", "to", "we", "with", "you", "your", "will",
];

pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Vec<f32>;
}

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

/// Splits into lower-case tokens. `+`, `#` and `.` stay inside tokens so
/// "c++", "c#" and "node.js" survive.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#' || c == '.'))
        .map(|t| t.trim_matches('.').to_lowercase())
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(&t.as_str()))
}

impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];

        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

/// Cosine similarity in [-1, 1]; 0 when either vector is all zeros or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("Built Kafka pipelines in Rust");
        let b = embedder.embed("Built Kafka pipelines in Rust");
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSIONS);

        let norm = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_similar_texts_score_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("Rust distributed systems engineer");
        let close = embedder.embed("Designed distributed systems in Rust");
        let far = embedder.embed("Managed the office kitchen budget");

        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_stopwords_only_text_embeds_to_zero() {
        let embedder = HashingEmbedder::default();
        let vector = embedder.embed("and the of");
        assert!(vector.iter().all(|v| *v == 0.0));
        assert_eq!(cosine_similarity(&vector, &embedder.embed("rust")), 0.0);
    }

    #[test]
    fn test_tokens_keep_language_names() {
        let collected: Vec<String> = tokens("C++, C# and Node.js.").collect();
        assert_eq!(collected, vec!["c++", "c#", "node.js"]);
    }

    #[test]
    fn test_cosine_similarity_of_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
