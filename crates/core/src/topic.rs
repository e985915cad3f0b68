use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::embedding::{EmbeddingCache, EmbeddingProvider, cosine_similarity};
use crate::error::{ConfigError, non_zero, unit_range};
use crate::history::BoundedHistory;
use crate::segment::TranscriptSegment;
use crate::signal::{SignalDetail, TimingSignal};

const EXCERPT_CHARS: usize = 100;

/// Detects semantic discontinuity between a new segment and the recent window.
pub struct TopicShiftDetector {
    provider: Arc<dyn EmbeddingProvider>,
    window: BoundedHistory<TranscriptSegment>,
    cache: EmbeddingCache,
    shift_threshold: f32,
    embed_timeout: Duration,
}

impl TopicShiftDetector {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        window: usize,
        cache_capacity: usize,
        shift_threshold: f32,
        embed_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            provider,
            window: BoundedHistory::with_capacity(non_zero("topic_window", window)?),
            cache: EmbeddingCache::new(non_zero("embedding_cache_capacity", cache_capacity)?),
            shift_threshold: unit_range("topic_shift_threshold", shift_threshold)?,
            embed_timeout: non_zero("embedding_timeout", embed_timeout)?,
        })
    }

    /// Compares `segment` with the window and appends it afterwards.
    ///
    /// The first segment of a session has nothing to compare against and never
    /// produces a signal. Embedding failures and timeouts are logged and
    /// treated as "no signal"; the segment still joins the window.
    pub async fn detect_topic_shift(&mut self, segment: &TranscriptSegment) -> Option<TimingSignal> {
        if self.window.is_empty() {
            self.window.push(segment.clone());
            return None;
        }

        let signal = match self.average_similarity(&segment.text).await {
            Ok(Some(similarity)) if similarity < self.shift_threshold => {
                tracing::debug!(similarity, "topic shift detected");
                Some(TimingSignal::new(
                    1.0 - similarity,
                    segment.timestamp,
                    SignalDetail::TopicShift {
                        previous_topic_similarity: similarity,
                        segment_excerpt: segment.text.chars().take(EXCERPT_CHARS).collect(),
                    },
                ))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Skipping topic shift detection for segment: {:#}", e);
                None
            }
        };

        self.window.push(segment.clone());
        signal
    }

    /// Recency-weighted mean similarity of `text` to the window.
    ///
    /// Zero vectors carry no topic: `None` when `text` embeds to one, and such
    /// priors are left out of the average.
    async fn average_similarity(&mut self, text: &str) -> Result<Option<f32>> {
        let current = self.embedding_for(text).await?;
        if !has_content(&current) {
            return Ok(None);
        }

        let texts: Vec<String> = self.window.iter().map(|s| s.text.clone()).collect();
        let mut priors = Vec::with_capacity(texts.len());
        for prior in &texts {
            let embedding = self.embedding_for(prior).await?;
            anyhow::ensure!(
                embedding.len() == current.len(),
                "Embedding dimensions differ: {} vs {}",
                current.len(),
                embedding.len()
            );
            if has_content(&embedding) {
                priors.push(embedding);
            }
        }
        if priors.is_empty() {
            return Ok(None);
        }

        let len = priors.len() as f32;
        let total: f32 = priors
            .iter()
            .enumerate()
            .rev()
            .map(|(position, embedding)| {
                let weight = (position + 1) as f32 / len;
                cosine_similarity(&current, embedding) * weight
            })
            .sum();

        Ok(Some(total / len))
    }

    async fn embedding_for(&mut self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.get(text) {
            return Ok(cached.to_vec());
        }

        let embedding = tokio::time::timeout(self.embed_timeout, self.provider.embed(text))
            .await
            .with_context(|| format!("Embedding request timed out after {:?}", self.embed_timeout))?
            .context("Embedding provider failed")?;

        self.cache.insert(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.cache.clear();
    }
}

fn has_content(embedding: &[f32]) -> bool {
    embedding.iter().any(|x| *x != 0.0)
}
