pub mod config;
pub mod hashing;
pub mod openai;

use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use config::EmbeddingClientConfig;
pub use hashing::HashingEmbedder;
pub use openai::OpenAiEmbedder;

pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: usize = 20;

// The topic shift detector depends on this trait rather than on a concrete
// HTTP client, so tests can hand it a `MockEmbeddingProvider` or a stub with
// fixed vectors. Implementations must return vectors of a fixed dimensionality
// and be deterministic enough that identical text yields a stable similarity.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Cosine similarity of two equally sized vectors.
///
/// A zero-norm vector has no direction, so its similarity to anything is 0.
/// Mismatched lengths also yield 0; callers that need to tell the two apart
/// check dimensions first.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Text → embedding cache that evicts the oldest insertion once full.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: HashMap<String, Vec<f32>>,
    order: VecDeque<String>,
    capacity: usize,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, text: &str) -> Option<&[f32]> {
        self.entries.get(text).map(Vec::as_slice)
    }

    pub fn insert(&mut self, text: String, embedding: Vec<f32>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(text.clone(), embedding).is_none() {
            self.order.push_back(text);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
